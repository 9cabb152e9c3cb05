//! Error taxonomy shared by every layer.
//!
//! Three families, kept apart so callers can tell a flaky network from a
//! broken index:
//!
//! - [`FetchError`] — the remote could not be reached, timed out, or answered
//!   with a non-success status.
//! - [`DecodeError`] — bytes arrived but do not match the page or blob format.
//! - [`SearchError`] — everything the engine can report, wrapping the two
//!   above plus traversal and query failures.

use std::time::Duration;

use thiserror::Error;

/// Failure to decode a node page or a suggestion blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A key length prefix outside `1..=32`.
    #[error("key size {size} at byte {offset} is outside 1..=32")]
    InvalidKeySize { size: u32, offset: usize },

    /// The structure claims more bytes than the buffer holds.
    #[error("needed {needed} bytes at offset {offset} but the buffer holds {len}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// A header or tag string is not UTF-8.
    #[error("string at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
}

/// Failure reported by a [`Fetch`](crate::fetch::Fetch) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, TLS or body-read failure.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The remote answered, but not with a success status.
    #[error("{url} answered with status {status}")]
    Remote { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("timed out after {timeout:?} fetching {url}")]
    Timeout { url: String, timeout: Duration },
}

impl FetchError {
    /// Transport failures and timeouts may succeed on a later attempt; a
    /// non-success status will not. Nothing in this crate retries; the
    /// predicate is for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Timeout { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Remote { url, .. }
            | FetchError::Timeout { url, .. } => url,
        }
    }
}

/// Everything the index search engine can fail with.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Input was not of the form `field:term`.
    #[error("invalid query {0:?}: expected \"field:term\"")]
    InvalidQuery(String),

    /// The descent ended at a leaf without meeting the term's key.
    #[error("no index entry for {term:?} in field {field:?}")]
    NoSuchTerm { field: String, term: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A fetched page or blob did not decode.
    #[error("malformed data from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: DecodeError,
    },

    /// The tree is internally inconsistent, usually an index/version mismatch.
    #[error("corrupt index for field {field:?}: {reason}")]
    CorruptIndex { field: String, reason: String },

    /// The descent went deeper than the configured guard.
    #[error("descent for field {field:?} exceeded {max_depth} levels")]
    DepthExceeded { field: String, max_depth: usize },

    #[error("search cancelled")]
    Cancelled,
}

impl SearchError {
    /// Decode failures and a corrupt tree mean the remote data is wrong, as
    /// opposed to the transport being flaky or the term being absent.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            SearchError::Decode { .. }
                | SearchError::CorruptIndex { .. }
                | SearchError::DepthExceeded { .. }
        )
    }

    /// `NoSuchTerm` is an expected negative answer; callers should not log it
    /// as a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchError::NoSuchTerm { .. })
    }

    pub(crate) fn corrupt(field: &str, reason: impl Into<String>) -> Self {
        SearchError::CorruptIndex {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
