//! pagetree-core — read-only client for remote paginated B-tree indexes.
//!
//! Exposes the page codec, the suggestion decoder, the shard script resolver
//! and the search engine, plus the shared types and errors they use.
//!
//! # Architecture
//!
//! ```text
//! query ──► search ──► fetch (Range GET) ──► codec ──► search ...
//!              │
//!              └──► fetch (data blob) ──► suggestion
//!
//! control script ──► script ──► shard letter / storage path
//! ```
//!
//! Nothing here touches the network directly. The engine is generic over
//! [`Fetch`]; `pagetree-fetch` supplies the HTTP implementation.

pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod script;
pub mod search;
pub mod suggestion;
pub mod types;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use codec::decode_node;
pub use config::Config;
pub use endpoint::{Endpoints, IndexClass};
pub use error::{DecodeError, FetchError, SearchError};
pub use fetch::Fetch;
pub use script::{parse_script, ShardControlState, ShardResolver};
pub use search::{hash_term, IndexSearch, SearchOptions};
pub use suggestion::decode_suggestions;
pub use types::{Locator, Suggestion, TreeNode, PAGE_SIZE};
