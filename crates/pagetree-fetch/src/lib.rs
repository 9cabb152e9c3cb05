//! pagetree-fetch — network adapter for pagetree.
//!
//! Provides [`HttpFetcher`], the production [`Fetch`](pagetree_core::Fetch)
//! implementation. It speaks HTTP/1.1 over plain TCP or TLS (rustls with the
//! bundled webpki roots) and enforces a per-request timeout.

pub mod http;

pub use http::{BuildError, HttpFetcher};
