//! Pagination bookkeeping and the page load state machine.
//!
//! ```text
//!   Idle ──go_to──▶ Loading(i) ──ok──▶ Idle
//!                      │
//!                      └──err──▶ Error(i, cause) ──retry──▶ Loading(i)
//! ```
//!
//! Only one load is current at a time. Every request carries a sequence
//! number; a result is applied only if its sequence is still the latest one.

use crate::error::BrowserError;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading(usize),
    Error { index: usize, cause: BrowserError },
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    pub fn error(&self) -> Option<&BrowserError> {
        match self {
            Self::Error { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Ticket for one page load. Hand it back to `Paginator::accept` with the
/// result; stale tickets are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: usize,
    pub seq: u64,
}

#[derive(Debug, Clone)]
pub struct Paginator {
    page_size: usize,
    page_cap: Option<usize>,
    /// Zero-based index of the page on display
    current: usize,
    state: LoadState,
    seq: u64,
}

impl Paginator {
    pub fn new(page_size: usize, page_cap: Option<usize>) -> Self {
        Self {
            page_size: page_size.max(1),
            page_cap: page_cap.filter(|cap| *cap > 0),
            current: 0,
            state: LoadState::Idle,
            seq: 0,
        }
    }

    /// `ceil(known_count / page_size)`, bounded by `hard_cap` when given
    pub fn total_pages(known_count: usize, page_size: usize, hard_cap: Option<usize>) -> usize {
        let computed = known_count.div_ceil(page_size.max(1));
        match hard_cap {
            Some(cap) => computed.min(cap),
            None => computed,
        }
    }

    /// Check a 1-based page number against `[1, max_page]` and return its
    /// zero-based index
    pub fn validate(page_number: usize, max_page: usize) -> Result<usize, BrowserError> {
        if page_number == 0 || page_number > max_page.max(1) {
            return Err(BrowserError::InvalidPage {
                requested: page_number,
                max: max_page.max(1),
            });
        }
        Ok(page_number - 1)
    }

    /// Zero-based index for `page_number`, clamped into range
    pub fn clamp(page_number: usize, max_page: usize) -> usize {
        match Self::validate(page_number, max_page) {
            Ok(index) => index,
            Err(err) => {
                debug!(target: "pagination", "Clamping request: {}", err);
                page_number.clamp(1, max_page.max(1)) - 1
            }
        }
    }

    pub fn pages_for(&self, known_count: usize) -> usize {
        Self::total_pages(known_count, self.page_size, self.page_cap)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_cap(&self) -> Option<usize> {
        self.page_cap
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Move to `index` without loading anything (page already available)
    pub fn show(&mut self, index: usize) {
        self.seq += 1;
        self.current = index;
        self.state = LoadState::Idle;
    }

    /// Enter `Loading(index)`, superseding any load in progress
    pub fn begin(&mut self, index: usize) -> PageRequest {
        self.seq += 1;
        if let LoadState::Loading(previous) = self.state {
            if previous != index {
                debug!(
                    target: "pagination",
                    "Load of page {} superseded by page {}",
                    previous + 1,
                    index + 1
                );
            }
        }
        self.state = LoadState::Loading(index);
        PageRequest {
            index,
            seq: self.seq,
        }
    }

    /// Whether `request` is still the load the controller is waiting for
    pub fn is_current(&self, request: &PageRequest) -> bool {
        request.seq == self.seq && self.state == LoadState::Loading(request.index)
    }

    /// Apply the outcome of `request`. Returns false when the request was
    /// superseded and its outcome ignored.
    pub fn accept(&mut self, request: &PageRequest, outcome: Result<(), BrowserError>) -> bool {
        if !self.is_current(request) {
            debug!(
                target: "pagination",
                "Discarding stale result for page {} (seq {}, current seq {})",
                request.index + 1,
                request.seq,
                self.seq
            );
            return false;
        }

        match outcome {
            Ok(()) => {
                self.current = request.index;
                self.state = LoadState::Idle;
            }
            Err(cause) => {
                self.state = LoadState::Error {
                    index: request.index,
                    cause,
                };
            }
        }
        true
    }

    /// Index to reload when the last load failed
    pub fn retry_index(&self) -> Option<usize> {
        match &self.state {
            LoadState::Error { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_records_in_pages_of_five() {
        assert_eq!(Paginator::total_pages(12, 5, None), 3);
        assert_eq!(Paginator::total_pages(10, 5, None), 2);
        assert_eq!(Paginator::total_pages(0, 5, None), 0);
        assert_eq!(Paginator::total_pages(194, 5, Some(20)), 20);
        assert_eq!(Paginator::total_pages(12, 5, Some(20)), 3);
    }

    #[test]
    fn out_of_range_pages_clamp() {
        assert_eq!(Paginator::clamp(4, 3), 2);
        assert_eq!(Paginator::clamp(0, 3), 0);
        assert_eq!(Paginator::clamp(2, 3), 1);
        assert_eq!(Paginator::clamp(1, 0), 0);
        assert_eq!(
            Paginator::validate(4, 3),
            Err(BrowserError::InvalidPage { requested: 4, max: 3 })
        );
    }

    #[test]
    fn failure_keeps_current_page() {
        let mut paginator = Paginator::new(5, None);
        let request = paginator.begin(1);
        assert!(paginator.state().is_loading());

        let err = BrowserError::unavailable("down");
        assert!(paginator.accept(&request, Err(err.clone())));
        assert_eq!(paginator.current(), 0);
        assert_eq!(paginator.state().error(), Some(&err));
        assert_eq!(paginator.retry_index(), Some(1));

        let retry = paginator.begin(1);
        assert!(paginator.accept(&retry, Ok(())));
        assert_eq!(paginator.current(), 1);
        assert_eq!(paginator.state(), &LoadState::Idle);
    }

    #[test]
    fn newer_request_supersedes_older_one() {
        let mut paginator = Paginator::new(5, None);
        let slow = paginator.begin(1);
        let fast = paginator.begin(2);

        assert!(paginator.accept(&fast, Ok(())));
        assert!(!paginator.accept(&slow, Ok(())));
        assert_eq!(paginator.current(), 2);
    }

    #[test]
    fn showing_a_cached_page_cancels_pending_load() {
        let mut paginator = Paginator::new(5, None);
        let pending = paginator.begin(3);
        paginator.show(0);
        assert!(!paginator.accept(&pending, Err(BrowserError::unavailable("late"))));
        assert_eq!(paginator.state(), &LoadState::Idle);
    }
}
