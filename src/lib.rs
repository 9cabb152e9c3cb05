//! pagetree — command-line and library client for remote paginated B-tree
//! indexes.
//!
//! This crate ties the layers together so that integration tests and the
//! binary can drive them through one [`Client`]:
//!
//! ```text
//! Client ──► IndexSearch ──► Fetch (HttpFetcher)
//!    │
//!    └────► ShardResolver ◄── control script
//! ```
//!
//! The building blocks are re-exported from `pagetree-core` and
//! `pagetree-fetch`.

pub mod client;

pub use client::{Client, ClientError};
pub use pagetree_core::{
    codec, config, endpoint, error, fetch, hash_term, script, search, suggestion, types, Config,
    DecodeError, Endpoints, Fetch, FetchError, IndexClass, IndexSearch, Locator, SearchError,
    SearchOptions, ShardControlState, ShardResolver, Suggestion, TreeNode, PAGE_SIZE,
};
pub use pagetree_fetch::HttpFetcher;
