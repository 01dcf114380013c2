//! Data layer
//!
//! Records, the catalog source abstraction and the page cache that sits
//! between the browser state and the remote service.

pub mod data_provider;
pub mod page_cache;
pub mod record;
pub mod static_source;

pub use data_provider::CatalogSource;
pub use page_cache::{CacheStats, PageCache};
pub use record::{Page, PageRecords, Record};
pub use static_source::StaticCatalogSource;
