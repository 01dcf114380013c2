//! Page cache and fetch coordinator
//!
//! Every read from the catalog goes through `PageCache::ensure_page`. A page
//! index is fetched at most once per cache generation: cached pages are
//! served without touching the source, and concurrent requests for the same
//! uncached index share one in-flight fetch.

use crate::data::data_provider::CatalogSource;
use crate::data::record::{Page, PageRecords, Record};
use crate::error::BrowserResult;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

type InFlight = Arc<OnceCell<BrowserResult<PageRecords>>>;

#[derive(Default)]
struct CacheState {
    pages: HashMap<usize, PageRecords>,
    /// Indices present in `pages`, ordered for `all_records`
    fetched: BTreeSet<usize>,
    in_flight: HashMap<usize, InFlight>,
    /// Bumped by `invalidate`; fetches started under an older generation are not stored
    generation: u64,
    /// Bumped on every store and invalidate
    version: u64,
    remote_total: Option<usize>,
    /// The highest cached page came back full, so the collection may go on
    last_page_full: bool,
}

/// Snapshot of cache counters for the status line and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub pages: usize,
    pub records: usize,
    pub in_flight: usize,
    pub version: u64,
}

#[derive(Default)]
pub struct PageCache {
    state: Mutex<CacheState>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return page `index`, fetching it from `source` only if it is not cached.
    ///
    /// On failure the cache is left exactly as it was.
    pub async fn ensure_page<S>(
        &self,
        source: &S,
        index: usize,
        page_size: usize,
    ) -> BrowserResult<PageRecords>
    where
        S: CatalogSource + ?Sized,
    {
        let (cell, generation) = {
            let mut state = self.lock();
            if let Some(records) = state.pages.get(&index) {
                trace!(target: "page_cache", "Page {} served from cache", index);
                return Ok(records.clone());
            }
            let generation = state.generation;
            let cell = state
                .in_flight
                .entry(index)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            (cell, generation)
        };

        cell.get_or_init(|| async {
            let offset = index * page_size;
            debug!(
                target: "page_cache",
                "Fetching page {} (offset {}, limit {}) from {}",
                index,
                offset,
                page_size,
                source.describe()
            );
            let fetched = source.fetch_page(offset, page_size).await;
            self.settle(index, page_size, generation, &cell, fetched)
        })
        .await
        .clone()
    }

    fn settle(
        &self,
        index: usize,
        page_size: usize,
        generation: u64,
        cell: &InFlight,
        fetched: BrowserResult<Page>,
    ) -> BrowserResult<PageRecords> {
        let mut state = self.lock();
        if state
            .in_flight
            .get(&index)
            .is_some_and(|current| Arc::ptr_eq(current, cell))
        {
            state.in_flight.remove(&index);
        }

        let page = match fetched {
            Ok(page) => page,
            Err(err) => {
                warn!(target: "page_cache", "Fetch of page {} failed: {}", index, err);
                return Err(err);
            }
        };

        if state.generation != generation {
            debug!(
                target: "page_cache",
                "Dropping page {} from generation {} (cache is at {})",
                index,
                generation,
                state.generation
            );
            return Ok(page.records);
        }

        if let Some(total) = page.total {
            if state.remote_total.is_some_and(|known| known != total) {
                debug!(
                    target: "page_cache",
                    "Remote collection size changed: {:?} -> {}",
                    state.remote_total,
                    total
                );
            }
            state.remote_total = Some(total);
        }

        state.pages.insert(index, page.records.clone());
        state.fetched.insert(index);
        if state.fetched.last() == Some(&index) {
            state.last_page_full = page.records.len() >= page_size;
        }
        state.version += 1;
        debug!(
            target: "page_cache",
            "Cached page {} ({} records, {} pages cached)",
            index,
            page.records.len(),
            state.fetched.len()
        );
        Ok(page.records)
    }

    /// Drop every cached page and forget which indices were fetched
    pub fn invalidate(&self) {
        let mut state = self.lock();
        let dropped = state.fetched.len();
        state.pages.clear();
        state.fetched.clear();
        state.in_flight.clear();
        state.last_page_full = false;
        state.generation += 1;
        state.version += 1;
        debug!(
            target: "page_cache",
            "Invalidated cache ({} pages dropped, generation {})",
            dropped,
            state.generation
        );
    }

    pub fn get(&self, index: usize) -> Option<PageRecords> {
        self.lock().pages.get(&index).cloned()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.lock().fetched.contains(&index)
    }

    pub fn fetched_indices(&self) -> Vec<usize> {
        self.lock().fetched.iter().copied().collect()
    }

    /// Records of every cached page in page order, first occurrence of each id wins.
    ///
    /// A live remote collection can shift records across page boundaries
    /// between fetches, so the same id may show up on two cached pages.
    pub fn all_records(&self) -> Vec<Record> {
        let state = self.lock();
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for index in &state.fetched {
            if let Some(page) = state.pages.get(index) {
                for record in page.iter() {
                    if seen.insert(record.id) {
                        records.push(record.clone());
                    }
                }
            }
        }
        records
    }

    /// Find a cached record by id
    pub fn find(&self, id: u64) -> Option<Record> {
        let state = self.lock();
        state
            .pages
            .values()
            .flat_map(|page| page.iter())
            .find(|record| record.id == id)
            .cloned()
    }

    /// Latest collection size reported by the source
    pub fn remote_total(&self) -> Option<usize> {
        self.lock().remote_total
    }

    /// Best known size of the remote collection.
    ///
    /// Without a reported total this is the number of cached records, plus
    /// one while the last cached page was full so paging can move past it.
    pub fn known_count(&self) -> usize {
        let state = self.lock();
        if let Some(total) = state.remote_total {
            return total;
        }
        let cached: usize = state.pages.values().map(|page| page.len()).sum();
        cached + usize::from(state.last_page_full)
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            pages: state.fetched.len(),
            records: state.pages.values().map(|page| page.len()).sum(),
            in_flight: state.in_flight.len(),
            version: state.version,
        }
    }
}
