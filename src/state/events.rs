//! Browser events and the observer interface renderers implement

use crate::data::record::Record;
use crate::state::pagination::LoadState;
use std::sync::{Arc, PoisonError, RwLock};

/// Things that happened to the browser state, kept for the log panel
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    /// Search term applied (after debouncing)
    SearchChanged { term: String, matches: usize },
    /// Selection membership changed
    SelectionChanged { selected: usize },
    /// Page load state moved
    LoadStateChanged(LoadState),
    /// A page is now on display (1-based)
    PageShown { page: usize, total_pages: usize },
    /// Cache dropped by an explicit refresh
    CacheInvalidated,
}

/// Passive consumer of browser state changes.
///
/// Callbacks run synchronously on the thread that mutated the browser and
/// must not call back into it.
pub trait BrowserObserver: Send {
    /// Called whenever the selection set changes, with every selected record
    fn on_selection_changed(&mut self, records: &[Record]);

    fn on_load_state_changed(&mut self, _state: &LoadState) {}

    /// Name for logging
    fn name(&self) -> &str;
}

/// Shared copy of the current selection, readable by a renderer while the
/// browser keeps ownership of the selection set itself
#[derive(Debug, Clone, Default)]
pub struct SelectionSnapshot {
    records: Arc<RwLock<Vec<Record>>>,
}

impl SelectionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BrowserObserver for SelectionSnapshot {
    fn on_selection_changed(&mut self, records: &[Record]) {
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
    }

    fn name(&self) -> &str {
        "selection-snapshot"
    }
}
