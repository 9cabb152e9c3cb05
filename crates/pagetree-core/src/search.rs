//! Index search engine — remote B-tree descent over an injected [`Fetch`].
//!
//! A query `field:term` is answered in three steps:
//!
//! 1. hash the term to a 4-byte key (`sha256(term)[..4]`);
//! 2. starting at the root page (address 0), fetch one page per level until a
//!    page holds the key or a leaf is reached;
//! 3. fetch and decode the data blob the matching key points at.
//!
//! Version tokens are cached per [`IndexClass`] for the engine's lifetime.
//! With whole-index caching on, each index file is fetched once and pages are
//! sliced out of the cached copy; otherwise every page is a ranged fetch.
//!
//! Caches belong to the engine instance. Concurrent first users of a class or
//! file share one in-flight fetch.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::{OnceCell, RwLock};
use tokio_util::sync::CancellationToken;

use crate::codec::decode_node;
use crate::config::Config;
use crate::endpoint::{Endpoints, IndexClass};
use crate::error::{DecodeError, SearchError};
use crate::fetch::Fetch;
use crate::suggestion::decode_suggestions;
use crate::types::{Locator, Probe, Suggestion, TreeNode, CHILD_SLOTS, PAGE_SIZE};

/// Length of the search key derived from a term.
pub const KEY_LEN: usize = 4;

/// Default bound on descent depth. Real indexes are a handful of levels deep.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Compact search key for `term`: the first four bytes of its SHA-256.
pub fn hash_term(term: &str) -> [u8; KEY_LEN] {
    let digest = Sha256::digest(term.as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest[..KEY_LEN]);
    key
}

/// Split `field:term`. Exactly one colon and a non-empty field without `/`
/// are required; the term may be empty.
pub fn split_query(query: &str) -> Result<(&str, &str), SearchError> {
    let mut parts = query.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(term), None) if !field.is_empty() && !field.contains('/') => {
            Ok((field, term))
        }
        _ => Err(SearchError::InvalidQuery(query.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Root of the index host, e.g. `https://ltn.hitomi.la`.
    pub index_base: String,
    /// Fetch each index file once and slice pages locally.
    pub cache_whole_index: bool,
    /// Maximum number of child fetches in one descent.
    pub max_depth: usize,
}

impl SearchOptions {
    pub fn new(index_base: impl Into<String>) -> Self {
        Self {
            index_base: index_base.into(),
            cache_whole_index: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl From<&Config> for SearchOptions {
    fn from(config: &Config) -> Self {
        Self {
            index_base: config.remote.index_base.clone(),
            cache_whole_index: config.search.cache_whole_index,
            max_depth: config.search.max_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

type Slots<K, V> = RwLock<HashMap<K, Arc<OnceCell<V>>>>;

/// Read-only client for the remote paginated B-tree indexes.
pub struct IndexSearch<F> {
    fetcher: F,
    endpoints: Endpoints,
    cache_whole_index: bool,
    max_depth: usize,
    versions: Slots<IndexClass, String>,
    blobs: Slots<String, Bytes>,
}

impl<F: Fetch> IndexSearch<F> {
    pub fn new(fetcher: F, options: SearchOptions) -> Self {
        Self {
            fetcher,
            endpoints: Endpoints::new(options.index_base),
            cache_whole_index: options.cache_whole_index,
            max_depth: options.max_depth,
            versions: RwLock::default(),
            blobs: RwLock::default(),
        }
    }

    pub fn with_whole_index_caching(mut self, enabled: bool) -> Self {
        self.cache_whole_index = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn caches_whole_index(&self) -> bool {
        self.cache_whole_index
    }

    /// Version token of `class`, fetched on first use and kept for the
    /// engine's lifetime. A failed fetch is not cached.
    pub async fn index_version(&self, class: IndexClass) -> Result<String, SearchError> {
        let cell = slot(&self.versions, &class).await;
        let version = cell
            .get_or_try_init(|| async {
                let url = self
                    .endpoints
                    .version_url(class, chrono::Utc::now().timestamp_millis());
                tracing::debug!(%class, %url, "index version not cached, fetching");
                let body = self.fetcher.fetch(&url).await?;
                let token = String::from_utf8_lossy(&body).trim().to_string();
                if token.is_empty() || token.contains('/') {
                    return Err(SearchError::corrupt(
                        class.name(),
                        format!("unusable version token {token:?}"),
                    ));
                }
                tracing::debug!(%class, version = %token, "index version cached");
                Ok::<_, SearchError>(token)
            })
            .await?;
        Ok(version.clone())
    }

    /// Drop every cached version token and index file.
    pub async fn clear_cache(&self) {
        self.versions.write().await.clear();
        self.blobs.write().await.clear();
    }

    /// Fetch and decode the page at `address` of `field`'s index.
    pub async fn node_at(&self, field: &str, address: u64) -> Result<TreeNode, SearchError> {
        let class = IndexClass::for_field(field);
        let version = self.index_version(class).await?;
        let url = self.endpoints.index_url(class, field, &version);

        let page = if self.cache_whole_index {
            let blob = self.whole_index(&url).await?;
            page_slice(&blob, address).map_err(|source| SearchError::Decode {
                url: url.clone(),
                source,
            })?
        } else {
            tracing::debug!(field, address, %url, "fetching page");
            let end = address.saturating_add(PAGE_SIZE - 1);
            self.fetcher.fetch_range(&url, address, end).await?
        };

        decode_node(&page).map_err(|source| SearchError::Decode { url, source })
    }

    /// Descend from `node` towards `key`.
    ///
    /// Returns the locator paired with `key`, or `None` when a leaf is reached
    /// without meeting it.
    pub async fn search(
        &self,
        field: &str,
        key: &[u8],
        node: TreeNode,
    ) -> Result<Option<Locator>, SearchError> {
        let mut node = node;
        let mut depth = 0usize;

        loop {
            let branch = match node.probe(key) {
                Probe::Found(i) => {
                    return node.locators.get(i).copied().map(Some).ok_or_else(|| {
                        SearchError::corrupt(field, format!("key {i} has no paired locator"))
                    });
                }
                Probe::Descend(branch) => branch,
            };

            if node.is_leaf() {
                tracing::debug!(field, depth, "reached leaf without a match");
                return Ok(None);
            }

            let address = match node.children.get(branch) {
                Some(0) => {
                    return Err(SearchError::corrupt(
                        field,
                        format!("zero child address at branch {branch}"),
                    ))
                }
                Some(&address) => address,
                None => {
                    return Err(SearchError::corrupt(
                        field,
                        format!("branch {branch} is past the {CHILD_SLOTS} child slots"),
                    ))
                }
            };

            depth += 1;
            if depth > self.max_depth {
                return Err(SearchError::DepthExceeded {
                    field: field.to_string(),
                    max_depth: self.max_depth,
                });
            }

            tracing::debug!(field, depth, branch, address, "descending");
            node = self.node_at(field, address).await?;
        }
    }

    /// Fetch and decode the data blob `locator` points at.
    pub async fn tag_suggestions(
        &self,
        field: &str,
        locator: Locator,
    ) -> Result<Vec<Suggestion>, SearchError> {
        let class = IndexClass::for_field(field);
        let version = self.index_version(class).await?;
        let url = self.endpoints.data_url(class, field, &version);
        let end = locator.offset.saturating_add(u64::from(locator.length));

        tracing::debug!(field, offset = locator.offset, length = locator.length, %url, "fetching suggestion data");
        let blob = self.fetcher.fetch_range(&url, locator.offset, end).await?;
        decode_suggestions(&blob).map_err(|source| SearchError::Decode { url, source })
    }

    /// Suggestions for `field:term`.
    ///
    /// A term with no index entry is [`SearchError::NoSuchTerm`], never an
    /// empty list.
    pub async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, SearchError> {
        let (field, term) = split_query(query)?;
        let key = hash_term(term);

        let root = self.node_at(field, 0).await?;
        match self.search(field, &key, root).await? {
            Some(locator) => self.tag_suggestions(field, locator).await,
            None => Err(SearchError::NoSuchTerm {
                field: field.to_string(),
                term: term.to_string(),
            }),
        }
    }

    /// [`suggest`](Self::suggest), abandoned as soon as `cancel` fires.
    pub async fn suggest_until(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Suggestion>, SearchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SearchError::Cancelled),
            result = self.suggest(query) => result,
        }
    }

    async fn whole_index(&self, url: &str) -> Result<Bytes, SearchError> {
        let cell = slot(&self.blobs, &url.to_string()).await;
        let blob = cell
            .get_or_try_init(|| async {
                tracing::debug!(%url, "index file not cached, fetching whole file");
                self.fetcher.fetch(url).await.map_err(SearchError::from)
            })
            .await?;
        Ok(blob.clone())
    }
}

/// Shared once-cell for `key`, created on first request.
async fn slot<K, V>(slots: &Slots<K, V>, key: &K) -> Arc<OnceCell<V>>
where
    K: Eq + Hash + Clone,
{
    if let Some(cell) = slots.read().await.get(key) {
        return cell.clone();
    }
    slots.write().await.entry(key.clone()).or_default().clone()
}

/// The page at `address` of a cached index file, cut short at end of file the
/// same way a ranged fetch would be.
fn page_slice(blob: &Bytes, address: u64) -> Result<Bytes, DecodeError> {
    let start = usize::try_from(address).unwrap_or(usize::MAX);
    if start >= blob.len() {
        return Err(DecodeError::OutOfBounds {
            offset: start,
            needed: PAGE_SIZE as usize,
            len: blob.len(),
        });
    }
    let end = start.saturating_add(PAGE_SIZE as usize).min(blob.len());
    Ok(blob.slice(start..end))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
