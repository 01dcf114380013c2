//! Utility helpers used throughout the application.

pub mod debouncer;
pub mod logging;
