//! State management components
//!
//! `CatalogBrowser` is the single owner of page, search and selection state;
//! the other modules are the pieces it is built from.

pub mod browser;
pub mod events;
pub mod pagination;
pub mod selection;

pub use browser::{BrowserConfig, CatalogBrowser, FilterState, PageView};
pub use events::{BrowserEvent, BrowserObserver, SelectionSnapshot};
pub use pagination::{LoadState, PageRequest, Paginator};
pub use selection::{RowView, SelectionSet};
