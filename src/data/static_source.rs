//! In-memory catalog source
//!
//! Backs the `--demo` mode and the integration tests. It behaves like the
//! remote service (offset/limit paging, reported total) and can be told to
//! fail or stall so the error paths of the browser can be exercised.

use crate::data::data_provider::CatalogSource;
use crate::data::record::{Page, Record};
use crate::error::{BrowserError, BrowserResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

const DEMO_CATEGORIES: [&str; 6] = [
    "beauty",
    "fragrances",
    "furniture",
    "groceries",
    "kitchen-accessories",
    "laptops",
];

const DEMO_ITEMS: [&str; 10] = [
    "Essence Mascara",
    "Eyeshadow Palette",
    "Powder Canister",
    "Red Lipstick",
    "Calvin Klein CK One",
    "Wooden Bathroom Sink",
    "Annibale Colombo Bed",
    "Apple Juice",
    "Bamboo Spatula",
    "Lenovo Yoga 920",
];

#[derive(Debug, Default)]
struct FailurePlan {
    /// Offsets that fail every time they are requested
    offsets: HashSet<usize>,
    /// Fail every request regardless of offset
    all: bool,
}

pub struct StaticCatalogSource {
    records: Mutex<Vec<Record>>,
    latency: Mutex<Option<Duration>>,
    failures: Mutex<FailurePlan>,
    calls: AtomicUsize,
    requested: Mutex<Vec<(usize, usize)>>,
}

impl StaticCatalogSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            latency: Mutex::new(None),
            failures: Mutex::new(FailurePlan::default()),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// `count` generated products with ids `1..=count`
    pub fn generated(count: usize) -> Self {
        let records = (1..=count as u64)
            .map(|id| {
                let idx = (id as usize - 1) % DEMO_ITEMS.len();
                let category = DEMO_CATEGORIES[(id as usize - 1) % DEMO_CATEGORIES.len()];
                // Spread prices across all three chart bands
                let price = ((id * 37) % 60) as f64 + 0.99;
                Record::new(
                    id,
                    format!("{} #{}", DEMO_ITEMS[idx], id),
                    category,
                    price,
                    (id * 13) % 120,
                )
            })
            .collect();
        Self::new(records)
    }

    /// Offline catalog used by `--demo`
    pub fn demo() -> Self {
        Self::generated(100).with_latency(Duration::from_millis(120))
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Make every request for `offset` fail until `clear_failures` is called
    pub fn fail_offset(&self, offset: usize) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .offsets
            .insert(offset);
    }

    pub fn fail_all(&self, fail: bool) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .all = fail;
    }

    pub fn clear_failures(&self) {
        *self.failures.lock().unwrap_or_else(PoisonError::into_inner) = FailurePlan::default();
    }

    /// Simulate the live remote collection changing underneath the browser
    pub fn push_record(&self, record: Record) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    pub fn remove_record(&self, id: u64) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| r.id != id);
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `fetch_page` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(offset, limit)` of every request, in call order
    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn should_fail(&self, offset: usize) -> bool {
        let plan = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        plan.all || plan.offsets.contains(&offset)
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> BrowserResult<Page> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((offset, limit));

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.should_fail(offset) {
            debug!(target: "static_source", "Injected failure for offset {}", offset);
            return Err(BrowserError::unavailable(format!(
                "simulated outage at offset {}",
                offset
            )));
        }

        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let slice: Vec<Record> = records.iter().skip(offset).take(limit).cloned().collect();
        Ok(Page::new(offset, slice, Some(records.len())))
    }

    fn describe(&self) -> String {
        format!("demo catalog ({} products)", self.len())
    }
}
