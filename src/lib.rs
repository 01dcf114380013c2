pub mod api_client;
pub mod config;
pub mod data;
pub mod error;
pub mod search_filter;
pub mod state;
pub mod ui;
pub mod utils;
pub mod widgets;

pub use data::{CatalogSource, Page, PageCache, Record, StaticCatalogSource};
pub use error::{BrowserError, BrowserResult};
pub use state::{CatalogBrowser, PageView};
