//! User interface layer
//!
//! This module contains the TUI application and the renderers it draws with.

pub mod catalog_tui;
pub mod chart_renderer;
pub mod table_renderer;

pub use catalog_tui::{run_catalog_tui, CatalogApp};
