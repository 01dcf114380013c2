//! Configuration module
//!
//! Settings file handling: catalog source, paging, search and display.

pub mod config;

pub use config::Config;
