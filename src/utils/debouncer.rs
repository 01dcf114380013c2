use std::time::{Duration, Instant};

/// Holds the latest value pushed into it and releases it once no newer
/// value has arrived for `delay`.
///
/// Every `push` replaces the pending value and restarts the quiet period, so
/// a burst of keystrokes produces a single emission carrying the final text.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self::with_delay(Duration::from_millis(delay_ms))
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet period
    pub fn push(&mut self, value: T) {
        self.push_at(value, Instant::now());
    }

    pub fn push_at(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the pending value if the quiet period has elapsed
    pub fn poll(&mut self) -> Option<T> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, since)) if now.saturating_duration_since(*since) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Take the pending value right away (e.g. the user pressed Enter)
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Time left before the pending value is released
    pub fn time_remaining(&self) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, since)| self.delay.saturating_sub(since.elapsed()))
    }

    /// Drop the pending value without emitting it
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_emits_only_the_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(200);

        debouncer.push_at("c", start);
        debouncer.push_at("ca", start + Duration::from_millis(80));
        debouncer.push_at("cat", start + Duration::from_millis(160));

        assert_eq!(debouncer.poll_at(start + Duration::from_millis(300)), None);
        assert_eq!(
            debouncer.poll_at(start + Duration::from_millis(360)),
            Some("cat")
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll_at(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(100);
        debouncer.push_at(String::from("lap"), start);
        debouncer.cancel();
        assert_eq!(debouncer.poll_at(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn flush_skips_the_wait() {
        let mut debouncer = Debouncer::new(10_000);
        debouncer.push(7);
        assert_eq!(debouncer.poll(), None);
        assert_eq!(debouncer.flush(), Some(7));
        assert_eq!(debouncer.time_remaining(), None);
    }
}
