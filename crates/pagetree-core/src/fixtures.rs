//! Test support — page and blob encoders, a B-tree fixture builder and an
//! in-memory [`Fetch`].
//!
//! Compiled for this crate's own tests and, behind the `fixtures` feature, for
//! downstream harnesses and benches. Everything here panics on invalid input
//! rather than returning errors.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::endpoint::{Endpoints, IndexClass};
use crate::error::FetchError;
use crate::fetch::Fetch;
use crate::search::hash_term;
use crate::types::{Locator, TreeNode, CHILD_SLOTS, PAGE_SIZE};

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

/// Append the wire form of `node` to `buf`, without padding.
pub fn write_node(buf: &mut Vec<u8>, node: &TreeNode) {
    buf.extend_from_slice(&(node.keys.len() as u32).to_be_bytes());
    for key in &node.keys {
        buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
        buf.extend_from_slice(key);
    }
    buf.extend_from_slice(&(node.locators.len() as u32).to_be_bytes());
    for loc in &node.locators {
        buf.extend_from_slice(&loc.offset.to_be_bytes());
        buf.extend_from_slice(&loc.length.to_be_bytes());
    }
    for child in &node.children {
        buf.extend_from_slice(&child.to_be_bytes());
    }
}

/// One full page: `node` followed by zero padding up to [`PAGE_SIZE`].
pub fn encode_node(node: &TreeNode) -> Vec<u8> {
    let mut page = Vec::with_capacity(PAGE_SIZE as usize);
    write_node(&mut page, node);
    assert!(
        page.len() as u64 <= PAGE_SIZE,
        "node needs {} bytes, page holds {PAGE_SIZE}",
        page.len()
    );
    page.resize(PAGE_SIZE as usize, 0);
    page
}

/// A data blob holding `entries` as `(header, tag)` pairs.
pub fn encode_suggestions(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for (header, tag) in entries {
        for s in [header, tag] {
            buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        buf.extend_from_slice(&[0; 4]);
    }
    buf
}

// ---------------------------------------------------------------------------
// IndexFixture
// ---------------------------------------------------------------------------

/// Fluent builder for an index/data file pair.
///
/// Keys are sorted and packed into a balanced tree with at most `max_keys`
/// keys per page. The root is always the page at address 0.
#[derive(Debug, Clone)]
pub struct IndexFixtureBuilder {
    max_keys: usize,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Default for IndexFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexFixtureBuilder {
    pub fn new() -> Self {
        Self {
            max_keys: 16,
            entries: Vec::new(),
        }
    }

    /// Keys per page, clamped to `1..=16`. Small values give deep trees.
    pub fn max_keys(mut self, n: usize) -> Self {
        self.max_keys = n.clamp(1, 16);
        self
    }

    /// Index `term` under its hashed key.
    pub fn term(self, term: &str, suggestions: &[(&str, &str)]) -> Self {
        self.key(hash_term(term).to_vec(), suggestions)
    }

    /// Index a raw key.
    pub fn key(mut self, key: Vec<u8>, suggestions: &[(&str, &str)]) -> Self {
        assert!(
            (1..=32).contains(&key.len()),
            "key length {} is outside 1..=32",
            key.len()
        );
        self.entries.push((key, encode_suggestions(suggestions)));
        self
    }

    pub fn build(mut self) -> IndexFixture {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        for pair in self.entries.windows(2) {
            assert_ne!(pair[0].0, pair[1].0, "duplicate key {:02x?}", pair[0].0);
        }

        let mut data = Vec::new();
        let mut located = Vec::with_capacity(self.entries.len());
        for (key, blob) in self.entries {
            located.push((key, Locator::new(data.len() as u64, blob.len() as u32)));
            data.extend_from_slice(&blob);
        }

        let mut pages = Vec::new();
        let depth = pack(&mut pages, &located, self.max_keys);

        IndexFixture {
            index: Bytes::from(pages.concat()),
            data: Bytes::from(data),
            depth,
            page_count: pages.len(),
            locators: located.into_iter().collect(),
        }
    }
}

/// Write the subtree over `entries` into a freshly reserved slot of `pages`
/// and return its height.
fn pack(pages: &mut Vec<Vec<u8>>, entries: &[(Vec<u8>, Locator)], max_keys: usize) -> usize {
    let slot = pages.len();
    pages.push(Vec::new());

    let n = entries.len();
    let mut children = [0u64; CHILD_SLOTS];

    let (separators, height) = if n <= max_keys {
        (entries.to_vec(), 1)
    } else {
        let k = ((n - 1) / 2).min(max_keys).max(1);
        let cuts: Vec<usize> = (0..k).map(|i| (i + 1) * (n + 1) / (k + 1) - 1).collect();

        let mut height = 0;
        let mut start = 0;
        for (branch, &cut) in cuts.iter().chain(std::iter::once(&n)).enumerate() {
            children[branch] = pages.len() as u64 * PAGE_SIZE;
            height = height.max(pack(pages, &entries[start..cut], max_keys));
            start = cut + 1;
        }
        (cuts.iter().map(|&c| entries[c].clone()).collect(), height + 1)
    };

    let node = TreeNode {
        keys: separators.iter().map(|(k, _)| k.clone()).collect(),
        locators: separators.iter().map(|(_, l)| *l).collect(),
        children,
    };
    pages[slot] = encode_node(&node);
    height
}

/// A built index/data file pair plus what the builder knows about it.
#[derive(Debug, Clone)]
pub struct IndexFixture {
    pub index: Bytes,
    pub data: Bytes,
    depth: usize,
    page_count: usize,
    locators: BTreeMap<Vec<u8>, Locator>,
}

impl IndexFixture {
    pub fn builder() -> IndexFixtureBuilder {
        IndexFixtureBuilder::new()
    }

    /// Levels from root to the deepest leaf, counting both.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Decoded root page.
    pub fn root(&self) -> TreeNode {
        crate::codec::decode_node(&self.index[..PAGE_SIZE as usize]).expect("fixture root page")
    }

    pub fn locator_of(&self, key: &[u8]) -> Locator {
        *self
            .locators
            .get(key)
            .unwrap_or_else(|| panic!("no key {key:02x?} in fixture"))
    }

    /// `(url, body)` for the version endpoint and the file pair of `field`,
    /// with the version URL given without its cache-busting query.
    pub fn files(&self, endpoints: &Endpoints, field: &str, version: &str) -> Vec<(String, Bytes)> {
        let class = IndexClass::for_field(field);
        vec![
            (
                endpoints.resource_url(&format!("{}/version", class.dir())),
                Bytes::from(version.to_string()),
            ),
            (endpoints.index_url(class, field, version), self.index.clone()),
            (endpoints.data_url(class, field, version), self.data.clone()),
        ]
    }

    pub fn install(&self, fetcher: &MemoryFetcher, endpoints: &Endpoints, field: &str, version: &str) {
        for (url, body) in self.files(endpoints, field, version) {
            fetcher.insert(url, body);
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryFetcher
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Inner {
    resources: HashMap<String, Bytes>,
    failures: HashMap<String, u16>,
    hits: HashMap<String, usize>,
    latency: Duration,
}

/// In-memory [`Fetch`] keyed by URL with the query string ignored.
///
/// Unknown URLs answer 404 and ranges starting past the end answer 416, the
/// way an HTTP server would.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    inner: Mutex<Inner>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        let url = url.into();
        self.lock().resources.insert(strip_query(&url).to_string(), body.into());
    }

    /// Answer every request for `url` with `status` until cleared.
    pub fn fail_with(&self, url: impl Into<String>, status: u16) {
        let url = url.into();
        self.lock().failures.insert(strip_query(&url).to_string(), status);
    }

    pub fn clear_failure(&self, url: &str) {
        self.lock().failures.remove(strip_query(url));
    }

    /// Delay applied to every request before it is answered.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Requests seen for `url`, whole and ranged alike.
    pub fn hits(&self, url: &str) -> usize {
        self.lock().hits.get(strip_query(url)).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.lock().hits.values().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory fetcher lock poisoned")
    }

    async fn lookup(&self, url: &str) -> Result<Bytes, FetchError> {
        let key = strip_query(url).to_string();
        let latency = {
            let mut inner = self.lock();
            *inner.hits.entry(key.clone()).or_default() += 1;
            inner.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let inner = self.lock();
        if let Some(&status) = inner.failures.get(&key) {
            return Err(FetchError::Remote {
                url: url.to_string(),
                status,
            });
        }
        inner.resources.get(&key).cloned().ok_or(FetchError::Remote {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[async_trait]
impl Fetch for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.lookup(url).await
    }

    async fn fetch_range(&self, url: &str, start: u64, end: u64) -> Result<Bytes, FetchError> {
        let body = self.lookup(url).await?;
        let len = body.len() as u64;
        if start >= len || end < start {
            return Err(FetchError::Remote {
                url: url.to_string(),
                status: 416,
            });
        }
        let stop = end.saturating_add(1).min(len);
        Ok(body.slice(start as usize..stop as usize))
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
