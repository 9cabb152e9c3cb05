//! The byte-fetching capability the engine is built on.
//!
//! The engine never talks to the network itself; it is handed something that
//! implements [`Fetch`]. `pagetree-fetch` provides the HTTP implementation and
//! the `fixtures` feature provides an in-memory one for tests.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// GET and Range-GET over some transport.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the whole resource at `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;

    /// Fetch bytes `start..=end` of the resource at `url`. `end` is inclusive,
    /// matching HTTP `Range: bytes=start-end`; a range running past the end of
    /// the resource returns what exists.
    async fn fetch_range(&self, url: &str, start: u64, end: u64) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        (**self).fetch(url).await
    }

    async fn fetch_range(&self, url: &str, start: u64, end: u64) -> Result<Bytes, FetchError> {
        (**self).fetch_range(url, start, end).await
    }
}
