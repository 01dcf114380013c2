//! Cross-page selection state.
//!
//! Membership is keyed by record id and is independent of which page or
//! filter view a record currently appears in. Each selected id keeps a
//! snapshot of the record taken when it was selected, so rendering the
//! selection never depends on that record's page still being cached.

use crate::data::record::Record;
use std::collections::HashMap;

/// A record of the current view annotated with its checked state
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub record: Record,
    pub checked: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    /// Snapshots by id
    snapshots: HashMap<u64, Record>,
    /// Ids in the order they were selected
    order: Vec<u64>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `record.id`. Returns the new checked state.
    pub fn toggle(&mut self, record: &Record) -> bool {
        if self.remove(record.id) {
            false
        } else {
            self.snapshots.insert(record.id, record.clone());
            self.order.push(record.id);
            true
        }
    }

    /// Deselect `id`. Returns whether it was selected.
    pub fn remove(&mut self, id: u64) -> bool {
        if self.snapshots.remove(&id).is_some() {
            self.order.retain(|selected| *selected != id);
            true
        } else {
            false
        }
    }

    /// Select the first `count` records not already selected. Returns how
    /// many were added.
    pub fn seed<'a, I>(&mut self, records: I, count: usize) -> usize
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut added = 0;
        for record in records.into_iter().take(count) {
            if !self.contains(record.id) {
                self.snapshots.insert(record.id, record.clone());
                self.order.push(record.id);
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, id: u64) -> bool {
        self.snapshots.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.snapshots.get(&id)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn ids(&self) -> &[u64] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.order.clear();
    }

    pub fn annotate(&self, records: &[Record]) -> Vec<RowView> {
        records
            .iter()
            .map(|record| RowView {
                record: record.clone(),
                checked: self.contains(record.id),
            })
            .collect()
    }

    /// Every selected record, in selection order. Always `len()` items.
    pub fn materialize(&self) -> Vec<Record> {
        self.order
            .iter()
            .filter_map(|id| self.snapshots.get(id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> Record {
        Record::new(id, format!("Item {}", id), "misc", id as f64, id)
    }

    #[test]
    fn double_toggle_is_a_no_op() {
        let mut selection = SelectionSet::new();
        selection.toggle(&record(1));
        selection.toggle(&record(2));
        let before = selection.materialize();

        assert!(selection.toggle(&record(3)));
        assert!(!selection.toggle(&record(3)));
        assert_eq!(selection.materialize(), before);

        assert!(!selection.toggle(&record(1)));
        assert!(selection.toggle(&record(1)));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn annotate_marks_selected_rows() {
        let mut selection = SelectionSet::new();
        selection.toggle(&record(2));
        let rows = selection.annotate(&[record(1), record(2), record(3)]);
        let checked: Vec<bool> = rows.iter().map(|row| row.checked).collect();
        assert_eq!(checked, vec![false, true, false]);
    }

    #[test]
    fn materialize_returns_snapshots_in_selection_order() {
        let mut selection = SelectionSet::new();
        selection.toggle(&record(7));
        selection.toggle(&record(3));
        selection.toggle(&record(5));
        selection.toggle(&record(3));

        let ids: Vec<u64> = selection.materialize().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 5]);
        assert_eq!(selection.materialize().len(), selection.len());
    }

    #[test]
    fn seed_skips_already_selected() {
        let mut selection = SelectionSet::new();
        selection.toggle(&record(2));
        let records: Vec<Record> = (1..=10).map(record).collect();

        let added = selection.seed(&records, 5);
        assert_eq!(added, 4);
        assert_eq!(selection.ids(), &[2, 1, 3, 4, 5]);
    }
}
