//! Shared test utilities for pagetree integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Time-dependent tests run against the in-memory fetcher
//! with `tokio::time::pause()`; network tests run against [`FakeIndexApi`].

pub mod assertions;
pub mod builders;
pub mod fake_index_api;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fake_index_api::FakeIndexApi;
pub use fixtures::*;
