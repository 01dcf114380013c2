use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One catalog item.
///
/// Records are never mutated after they are fetched; the only local state
/// attached to them (checked or not) lives in the selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: u64,
}

impl Record {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        quantity: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            price,
            quantity,
        }
    }

    /// Price formatted the way the table and chart show it
    pub fn price_label(&self) -> String {
        format!("{:.2}", self.price)
    }
}

/// Records of one page, shared between the cache and the views
pub type PageRecords = Arc<Vec<Record>>;

/// A bounded, ordered slice of records returned by one fetch call
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub offset: usize,
    pub records: PageRecords,
    /// Size of the whole remote collection, when the service reports it
    pub total: Option<usize>,
}

impl Page {
    pub fn new(offset: usize, records: Vec<Record>, total: Option<usize>) -> Self {
        Self {
            offset,
            records: Arc::new(records),
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
