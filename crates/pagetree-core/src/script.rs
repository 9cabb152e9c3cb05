//! Shard script resolver.
//!
//! The content host publishes a small, minified control script that rotates
//! every few minutes. Only three fragments of it matter here, so rather than
//! parse the language we apply independent patterns to the raw text:
//!
//! | fragment                 | contributes                         |
//! |--------------------------|-------------------------------------|
//! | `case 1234:` (every one) | an id in the membership set         |
//! | `b: '1712345678/'`       | the storage path prefix (first one) |
//! | `o = 1; break;`          | polarity 1 (absent: polarity 0)     |
//!
//! [`ShardResolver`] holds the currently installed [`ShardControlState`] and
//! its age. A refresh replaces the whole state; nothing is mutated in place.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tokio::sync::RwLock;
use tokio::time::Instant;

static CASE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"case (\d+):").expect("static regex"));
static PATH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"b: '(\d+/)'").expect("static regex"));
static TAKE_BRANCH_ONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bo\s*=\s*1;\s*break;").expect("static regex"));
static HASH_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[0-9a-f]{61}([0-9a-f]{2})([0-9a-f])").expect("static regex"));

/// Shard letter used when a URL carries no recognisable content hash.
pub const FALLBACK_SHARD: &str = "a";

/// Suffix appended to the shard letter when the caller passes an empty base.
pub const DEFAULT_SHARD_BASE: &str = "b";

// ---------------------------------------------------------------------------
// ShardControlState
// ---------------------------------------------------------------------------

/// Parsed control script. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardControlState {
    membership: HashSet<u32>,
    path_prefix: String,
    polarity: u8,
}

/// Parse a control script. `None` when the script has no case labels or no
/// path prefix, which callers must read as "cannot compute addresses yet".
pub fn parse_script(text: &str) -> Option<ShardControlState> {
    let membership: HashSet<u32> = CASE_LABEL
        .captures_iter(text)
        .filter_map(|c| c[1].parse().ok())
        .collect();
    if membership.is_empty() {
        return None;
    }

    let path_prefix = PATH_PREFIX.captures(text)?[1].to_string();
    let polarity = u8::from(TAKE_BRANCH_ONE.is_match(text));

    Some(ShardControlState {
        membership,
        path_prefix,
        polarity,
    })
}

impl ShardControlState {
    /// Build a state directly. `polarity` must be 0 or 1.
    pub fn new(
        membership: impl IntoIterator<Item = u32>,
        path_prefix: impl Into<String>,
        polarity: u8,
    ) -> Option<Self> {
        (polarity <= 1).then(|| Self {
            membership: membership.into_iter().collect(),
            path_prefix: path_prefix.into(),
            polarity,
        })
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn polarity(&self) -> u8 {
        self.polarity
    }

    pub fn members(&self) -> usize {
        self.membership.len()
    }

    /// `polarity` for members, `1 - polarity` for everyone else, so the id
    /// space always splits into exactly two pools.
    pub fn select_bit(&self, id: u32) -> u8 {
        if self.membership.contains(&id) {
            self.polarity
        } else {
            1 - self.polarity
        }
    }

    /// Directory bucket of a content hash as a decimal string, empty when the
    /// hash is too short or its tail is not hex.
    pub fn path_suffix(&self, hash: &str) -> String {
        hash_bucket(hash).map(|b| b.to_string()).unwrap_or_default()
    }

    /// Two-character shard host prefix for `url`: `a` or `b` from the
    /// membership test on the embedded hash, followed by `base`.
    pub fn shard_letter(&self, url: &str, base: &str) -> String {
        let base = if base.is_empty() { DEFAULT_SHARD_BASE } else { base };
        let Some(caps) = HASH_TAIL.captures(url) else {
            return FALLBACK_SHARD.to_string();
        };
        let Ok(g) = u32::from_str_radix(&format!("{}{}", &caps[2], &caps[1]), 16) else {
            return FALLBACK_SHARD.to_string();
        };
        let letter = char::from(b'a' + self.select_bit(g));
        format!("{letter}{base}")
    }

    /// `path_prefix + path_suffix(hash) + "/" + hash`.
    pub fn full_path(&self, hash: &str) -> String {
        format!("{}{}/{}", self.path_prefix, self.path_suffix(hash), hash)
    }
}

/// Last three characters `xyz` of `hash`, reordered to `zxy` and read as hex.
pub fn hash_bucket(hash: &str) -> Option<u32> {
    let tail = hash
        .get(hash.len().checked_sub(3)?..)
        .filter(|t| t.bytes().all(|b| b.is_ascii_hexdigit()))?;
    let (pair, last) = tail.split_at(2);
    u32::from_str_radix(&format!("{last}{pair}"), 16).ok()
}

// ---------------------------------------------------------------------------
// ShardResolver
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Installed {
    state: Arc<ShardControlState>,
    loaded_at: Instant,
}

/// Holder for the currently installed control state.
#[derive(Debug, Default)]
pub struct ShardResolver {
    current: RwLock<Option<Installed>>,
}

impl ShardResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held state wholesale and reset its age.
    pub async fn install(&self, state: ShardControlState) {
        let mut slot = self.current.write().await;
        *slot = Some(Installed {
            state: Arc::new(state),
            loaded_at: Instant::now(),
        });
    }

    pub async fn current(&self) -> Option<Arc<ShardControlState>> {
        self.current.read().await.as_ref().map(|i| i.state.clone())
    }

    /// Time since the held state was installed, `None` before the first one.
    pub async fn age(&self) -> Option<Duration> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|i| i.loaded_at.elapsed())
    }

    /// True when nothing is installed or the state is older than `interval`.
    pub async fn is_stale(&self, interval: Duration) -> bool {
        self.age().await.map_or(true, |age| age > interval)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
