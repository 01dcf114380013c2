//! The catalog browser state machine.
//!
//! `CatalogBrowser` owns the page cache, the search term, the selection set
//! and the pagination state, and is the only thing that mutates them.
//! Renderers read `PageView`s and subscribe as `BrowserObserver`s.
//!
//! Page loads are split in three steps so a UI loop can keep drawing while a
//! fetch is running:
//!
//! 1. `begin_go_to` (or `set_search_term`, `retry`, `refresh`) updates the
//!    state and returns a `PageRequest` when something has to be fetched,
//! 2. `load(request)` gives a `Send + 'static` future to run on the runtime,
//! 3. `complete_load(request, result)` applies the outcome, unless a newer
//!    request has superseded it.
//!
//! The `async` helpers (`go_to`, `search`, `initial_load`, ...) chain the
//! three steps for callers that can simply await.

use crate::data::data_provider::CatalogSource;
use crate::data::page_cache::PageCache;
use crate::data::record::{PageRecords, Record};
use crate::error::{BrowserError, BrowserResult};
use crate::search_filter::{FilterOptions, MemoizedFilter};
use crate::state::events::{BrowserEvent, BrowserObserver};
use crate::state::pagination::{LoadState, PageRequest, Paginator};
use crate::state::selection::{RowView, SelectionSet};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_EVENT_HISTORY: usize = 100;

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub page_size: usize,
    /// Upper bound on the page count shown to the user
    pub page_cap: Option<usize>,
    /// Records selected by default after the first successful load
    pub initial_selection: usize,
    /// Pages loaded up front (including the first) so search has data to work on
    pub prefetch_pages: usize,
    pub load_timeout: Duration,
    pub filter: FilterOptions,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            page_cap: None,
            initial_selection: 5,
            prefetch_pages: 1,
            load_timeout: Duration::from_secs(15),
            filter: FilterOptions::default(),
        }
    }
}

/// Search term plus the page currently shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub term: String,
    pub page_index: usize,
}

/// Read-only snapshot handed to the table renderer
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    /// 1-based page on display
    pub page: usize,
    pub total_pages: usize,
    pub rows: Vec<RowView>,
    pub load_state: LoadState,
    pub search_term: String,
    /// Number of records matching the search term, when one is active
    pub matches: Option<usize>,
    pub selected: usize,
}

pub struct CatalogBrowser<S: CatalogSource + ?Sized> {
    source: Arc<S>,
    cache: Arc<PageCache>,
    config: BrowserConfig,
    paginator: Paginator,
    selection: SelectionSet,
    term: String,
    filter: MemoizedFilter,
    /// Unfiltered page last loaded successfully; stays up while a load fails
    displayed: PageRecords,
    /// Cached records as they were before a refresh or page-size change
    /// dropped the cache. Searches run against these until the reload lands.
    reload_base: Option<Arc<Vec<Record>>>,
    seeded: bool,
    observers: Vec<Box<dyn BrowserObserver>>,
    history: VecDeque<BrowserEvent>,
}

impl<S: CatalogSource + ?Sized + 'static> CatalogBrowser<S> {
    pub fn new(source: Arc<S>, config: BrowserConfig) -> Self {
        let paginator = Paginator::new(config.page_size, config.page_cap);
        Self {
            source,
            cache: Arc::new(PageCache::new()),
            paginator,
            config,
            selection: SelectionSet::new(),
            term: String::new(),
            filter: MemoizedFilter::new(),
            displayed: Arc::new(Vec::new()),
            reload_base: None,
            seeded: false,
            observers: Vec::new(),
            history: VecDeque::with_capacity(MAX_EVENT_HISTORY),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn BrowserObserver>) {
        info!(target: "browser", "Adding observer: {}", observer.name());
        self.observers.push(observer);
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn load_state(&self) -> &LoadState {
        self.paginator.state()
    }

    pub fn is_searching(&self) -> bool {
        !self.term.is_empty()
    }

    pub fn filter_state(&self) -> FilterState {
        FilterState {
            term: self.term.clone(),
            page_index: self.paginator.current(),
        }
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.config.filter
    }

    /// Change how the search term is matched; re-filters immediately
    pub fn set_filter_options(&mut self, options: FilterOptions) {
        if self.config.filter == options {
            return;
        }
        self.config.filter = options;
        if self.is_searching() {
            self.paginator.show(0);
            let matches = self.filtered().len();
            self.record(BrowserEvent::SearchChanged {
                term: self.term.clone(),
                matches,
            });
        }
    }

    /// Whether a refresh or page-size change is still waiting for its first page
    pub fn is_reloading(&self) -> bool {
        self.reload_base.is_some()
    }

    /// Records matching the current term across every cached page
    fn filtered(&mut self) -> Arc<Vec<Record>> {
        let cache = self.cache.clone();
        let base = self.reload_base.clone();
        self.filter.apply(
            cache.version(),
            || match base {
                Some(records) => records.to_vec(),
                None => cache.all_records(),
            },
            &self.term,
            &self.config.filter,
        )
    }

    /// Size of the collection being paged: the remote total, or the match
    /// count while searching
    pub fn known_count(&mut self) -> usize {
        if self.is_searching() {
            self.filtered().len()
        } else {
            self.cache.known_count()
        }
    }

    pub fn total_pages(&mut self) -> usize {
        let known = self.known_count();
        self.paginator.pages_for(known)
    }

    /// Records on the page currently shown
    pub fn current_records(&mut self) -> Vec<Record> {
        if self.is_searching() {
            let start = self.paginator.current() * self.paginator.page_size();
            self.filtered()
                .iter()
                .skip(start)
                .take(self.paginator.page_size())
                .cloned()
                .collect()
        } else {
            self.displayed.to_vec()
        }
    }

    pub fn view(&mut self) -> PageView {
        let total_pages = self.total_pages();
        let records = self.current_records();
        let matches = if self.is_searching() {
            Some(self.filtered().len())
        } else {
            None
        };
        PageView {
            page: self.paginator.current() + 1,
            total_pages,
            rows: self.selection.annotate(&records),
            load_state: self.paginator.state().clone(),
            search_term: self.term.clone(),
            matches,
            selected: self.selection.len(),
        }
    }

    // ===== Loading =====

    /// First load of the session: always goes to the source for page 1
    pub fn begin_initial_load(&mut self) -> PageRequest {
        info!(
            target: "browser",
            "Initial load from {} (page size {})",
            self.source.describe(),
            self.paginator.page_size()
        );
        let request = self.paginator.begin(0);
        self.publish_load_state();
        request
    }

    /// Move to the 1-based `page_number`, clamped into range. Returns a
    /// request when the page has to be fetched.
    pub fn begin_go_to(&mut self, page_number: usize) -> Option<PageRequest> {
        let max_page = self.total_pages();
        let index = Paginator::clamp(page_number, max_page);
        self.begin_index(index)
    }

    fn begin_index(&mut self, index: usize) -> Option<PageRequest> {
        if self.is_searching() {
            // Filtered pages are sliced from the cache, nothing to fetch
            self.paginator.show(index);
            self.publish_page_shown();
            return None;
        }

        if let Some(records) = self.cache.get(index) {
            self.displayed = records;
            self.paginator.show(index);
            self.publish_load_state();
            self.publish_page_shown();
            return None;
        }

        let request = self.paginator.begin(index);
        self.publish_load_state();
        Some(request)
    }

    /// Future that fetches the page for `request`, bounded by the load timeout
    pub fn load(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = BrowserResult<PageRecords>> + Send + 'static {
        let cache = self.cache.clone();
        let source = self.source.clone();
        let page_size = self.paginator.page_size();
        let timeout = self.config.load_timeout;
        async move {
            let index = request.index;
            match tokio::time::timeout(timeout, cache.ensure_page(&*source, index, page_size)).await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target: "browser",
                        "Page {} did not load within {:?}",
                        index + 1,
                        timeout
                    );
                    Err(BrowserError::Timeout {
                        index,
                        after: timeout,
                    })
                }
            }
        }
    }

    /// Apply the outcome of `request`. Returns false if the request had
    /// been superseded and the outcome was dropped.
    pub fn complete_load(
        &mut self,
        request: PageRequest,
        result: BrowserResult<PageRecords>,
    ) -> bool {
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        if !self.paginator.accept(&request, outcome) {
            return false;
        }

        match result {
            Ok(records) => {
                debug!(
                    target: "browser",
                    "Page {} loaded ({} records)",
                    request.index + 1,
                    records.len()
                );
                self.displayed = records;
                if self.reload_base.take().is_some() {
                    self.filter.clear();
                }
                if !self.seeded {
                    self.seed_selection();
                }
                self.publish_load_state();
                self.publish_page_shown();
            }
            Err(err) => {
                warn!(
                    target: "browser",
                    "Page {} failed, keeping page {} on display: {}",
                    request.index + 1,
                    self.paginator.current() + 1,
                    err
                );
                self.publish_load_state();
            }
        }
        true
    }

    /// Reload the page whose last load failed. A page missing from the
    /// cache is always fetched, even while a search term is active.
    pub fn retry(&mut self) -> Option<PageRequest> {
        let index = self.paginator.retry_index()?;
        info!(target: "browser", "Retrying page {}", index + 1);
        if self.cache.contains(index) {
            return self.begin_index(index);
        }
        let request = self.paginator.begin(index);
        self.publish_load_state();
        Some(request)
    }

    /// Drop the cached pages, keeping what they held as the search base
    /// until the reload succeeds
    fn invalidate_for_reload(&mut self) {
        if self.reload_base.is_none() {
            self.reload_base = Some(Arc::new(self.cache.all_records()));
        }
        self.cache.invalidate();
        self.filter.clear();
        self.record(BrowserEvent::CacheInvalidated);
    }

    /// Drop the cache and reload, so the view reconciles with a remote
    /// collection that may have changed. The selection is kept, and the
    /// current rows stay up until the new page arrives.
    pub fn refresh(&mut self) -> PageRequest {
        self.invalidate_for_reload();
        let index = if self.is_searching() {
            0
        } else {
            self.paginator.current()
        };
        info!(target: "browser", "Refreshing from page {}", index + 1);
        let request = self.paginator.begin(index);
        self.publish_load_state();
        request
    }

    /// Change the page size. Cached pages no longer line up with the new
    /// page boundaries, so the cache is invalidated and paging restarts at 1.
    pub fn set_page_size(&mut self, page_size: usize) -> Option<PageRequest> {
        let page_size = page_size.max(1);
        if page_size == self.paginator.page_size() {
            return None;
        }
        info!(
            target: "browser",
            "Page size {} -> {}",
            self.paginator.page_size(),
            page_size
        );
        self.config.page_size = page_size;
        self.paginator = Paginator::new(page_size, self.config.page_cap);
        self.invalidate_for_reload();
        let request = self.paginator.begin(0);
        self.publish_load_state();
        Some(request)
    }

    /// Future that loads the pages after the first one, up to
    /// `prefetch_pages` in total or the end of the collection. Resolves to
    /// the number of pages that were fetched.
    pub fn prefetch(&self) -> impl Future<Output = usize> + Send + 'static {
        let cache = self.cache.clone();
        let source = self.source.clone();
        let page_size = self.paginator.page_size();
        let pages = self.config.prefetch_pages;
        let timeout = self.config.load_timeout;
        async move {
            let mut fetched = 0;
            for index in 1..pages {
                if cache
                    .remote_total()
                    .is_some_and(|total| index * page_size >= total)
                {
                    break;
                }
                if cache.contains(index) {
                    continue;
                }
                match tokio::time::timeout(timeout, cache.ensure_page(&*source, index, page_size))
                    .await
                {
                    Ok(Ok(records)) if records.is_empty() => break,
                    Ok(Ok(records)) if records.len() < page_size => {
                        // Short page: end of the collection
                        fetched += 1;
                        break;
                    }
                    Ok(Ok(_)) => fetched += 1,
                    Ok(Err(err)) => {
                        warn!(target: "browser", "Prefetch stopped at page {}: {}", index + 1, err);
                        break;
                    }
                    Err(_) => {
                        warn!(target: "browser", "Prefetch of page {} timed out", index + 1);
                        break;
                    }
                }
            }
            debug!(target: "browser", "Prefetched {} pages", fetched);
            fetched
        }
    }

    // ===== Search =====

    /// Apply a (debounced) search term. Any change resets to the first page.
    pub fn set_search_term(&mut self, term: &str) -> Option<PageRequest> {
        if term == self.term {
            return None;
        }
        self.term = term.to_string();

        if self.is_searching() {
            self.paginator.show(0);
            let matches = self.filtered().len();
            debug!(target: "browser", "Search '{}' matched {} records", term, matches);
            self.record(BrowserEvent::SearchChanged {
                term: self.term.clone(),
                matches,
            });
            self.publish_page_shown();
            None
        } else {
            let known = self.cache.known_count();
            self.record(BrowserEvent::SearchChanged {
                term: String::new(),
                matches: known,
            });
            self.begin_index(0)
        }
    }

    // ===== Selection =====

    /// Flip the checked state of `id`. Returns the new state, or `None` if
    /// the id is neither selected nor known to the browser.
    pub fn toggle(&mut self, id: u64) -> Option<bool> {
        let record = match self.selection.get(id) {
            Some(record) => record.clone(),
            None => match self
                .displayed
                .iter()
                .find(|record| record.id == id)
                .cloned()
                .or_else(|| self.cache.find(id))
                .or_else(|| {
                    self.reload_base
                        .as_ref()
                        .and_then(|base| base.iter().find(|record| record.id == id).cloned())
                })
            {
                Some(record) => record,
                None => {
                    warn!(target: "browser", "Toggle of unknown record {}", id);
                    return None;
                }
            },
        };

        let checked = self.selection.toggle(&record);
        debug!(
            target: "browser",
            "Record {} {}",
            id,
            if checked { "selected" } else { "deselected" }
        );
        self.publish_selection();
        Some(checked)
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection.clear();
        self.publish_selection();
    }

    fn seed_selection(&mut self) {
        self.seeded = true;
        if self.config.initial_selection == 0 {
            return;
        }
        let records = self.cache.all_records();
        let added = self
            .selection
            .seed(records.iter(), self.config.initial_selection);
        info!(target: "browser", "Preselected {} records", added);
        if added > 0 {
            self.publish_selection();
        }
    }

    // ===== Async conveniences =====

    /// Run a request returned by one of the `begin_*` methods to completion
    pub async fn run(&mut self, request: PageRequest) -> BrowserResult<()> {
        let result = self.load(request).await;
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.complete_load(request, result);
        outcome
    }

    /// Load page 1, seed the default selection, then prefetch
    pub async fn initial_load(&mut self) -> BrowserResult<()> {
        let request = self.begin_initial_load();
        self.run(request).await?;
        self.prefetch().await;
        Ok(())
    }

    pub async fn go_to(&mut self, page_number: usize) -> BrowserResult<()> {
        match self.begin_go_to(page_number) {
            Some(request) => self.run(request).await,
            None => Ok(()),
        }
    }

    pub async fn search(&mut self, term: &str) -> BrowserResult<()> {
        match self.set_search_term(term) {
            Some(request) => self.run(request).await,
            None => Ok(()),
        }
    }

    /// Retry the failed load. After a failed refresh the prefetch window is
    /// refilled as well.
    pub async fn retry_now(&mut self) -> BrowserResult<()> {
        let refill = self.is_reloading();
        let Some(request) = self.retry() else {
            return Ok(());
        };
        self.run(request).await?;
        if refill {
            self.prefetch().await;
        }
        Ok(())
    }

    pub async fn refresh_now(&mut self) -> BrowserResult<()> {
        let request = self.refresh();
        self.run(request).await?;
        self.prefetch().await;
        Ok(())
    }

    // ===== Notifications =====

    pub fn recent_events(&self, count: usize) -> Vec<BrowserEvent> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    fn record(&mut self, event: BrowserEvent) {
        if self.history.len() >= MAX_EVENT_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    fn publish_selection(&mut self) {
        let records = self.selection.materialize();
        for observer in &mut self.observers {
            observer.on_selection_changed(&records);
        }
        self.record(BrowserEvent::SelectionChanged {
            selected: records.len(),
        });
    }

    fn publish_load_state(&mut self) {
        let state = self.paginator.state().clone();
        for observer in &mut self.observers {
            observer.on_load_state_changed(&state);
        }
        self.record(BrowserEvent::LoadStateChanged(state));
    }

    fn publish_page_shown(&mut self) {
        let total_pages = self.total_pages();
        self.record(BrowserEvent::PageShown {
            page: self.paginator.current() + 1,
            total_pages,
        });
    }
}
