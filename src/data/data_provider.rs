//! Data source trait for the remote catalog
//!
//! The browser never talks HTTP directly. Everything it knows about the
//! catalog comes through `CatalogSource::fetch_page`, which lets the TUI run
//! against the live service, the offline demo catalog or a test double.

use crate::data::record::Page;
use crate::error::BrowserResult;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch up to `limit` records starting at `offset`.
    ///
    /// Any transport or decoding failure must come back as
    /// `BrowserError::Unavailable`.
    async fn fetch_page(&self, offset: usize, limit: usize) -> BrowserResult<Page>;

    /// Human readable description for the status line and logs
    fn describe(&self) -> String;
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Arc<S> {
    async fn fetch_page(&self, offset: usize, limit: usize) -> BrowserResult<Page> {
        (**self).fetch_page(offset, limit).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Box<S> {
    async fn fetch_page(&self, offset: usize, limit: usize) -> BrowserResult<Page> {
        (**self).fetch_page(offset, limit).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
