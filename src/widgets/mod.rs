//! UI widgets for the TUI application
//!
//! Self-contained components that own their state and rendering.

pub mod log_panel;
pub mod search_input;
