//! Core types shared by the codec, the decoders and the search engine.
//!
//! [`TreeNode`] is the decoded view of one index page, [`Locator`] points
//! into the companion data file, and [`Suggestion`] is one decoded entry of
//! that data file.

use std::fmt;

/// Fixed size of one index page, in bytes.
pub const PAGE_SIZE: u64 = 464;

/// Number of child address slots on every page.
pub const CHILD_SLOTS: usize = 17;

/// Inclusive upper bound on a key's length.
pub const MAX_KEY_SIZE: u32 = 32;

/// An `(offset, length)` pair pointing into a companion data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Locator {
    pub offset: u64,
    pub length: u32,
}

impl Locator {
    pub fn new(offset: u64, length: u32) -> Self {
        Self { offset, length }
    }
}

/// Outcome of scanning a node's keys for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// `keys[i] == target`.
    Found(usize),
    /// No exact match; continue through child slot `i`.
    Descend(usize),
}

/// One decoded index page.
///
/// `keys` ascend bytewise and pair positionally with `locators`. `children`
/// always has [`CHILD_SLOTS`] entries; zero marks an empty slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub keys: Vec<Vec<u8>>,
    pub locators: Vec<Locator>,
    pub children: [u64; CHILD_SLOTS],
}

impl TreeNode {
    /// A node is a leaf iff every child slot is zero.
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|&addr| addr == 0)
    }

    /// Scan keys in ascending order for the first one `>= target`.
    ///
    /// When every key is smaller the branch is `keys.len()`, i.e. the slot to
    /// the right of the last key.
    pub fn probe(&self, target: &[u8]) -> Probe {
        for (i, key) in self.keys.iter().enumerate() {
            match key.as_slice().cmp(target) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => return Probe::Found(i),
                std::cmp::Ordering::Greater => return Probe::Descend(i),
            }
        }
        Probe::Descend(self.keys.len())
    }

    /// Number of bytes the page structure occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let keys: usize = self.keys.iter().map(|k| 4 + k.len()).sum();
        4 + keys + 4 + self.locators.len() * 12 + CHILD_SLOTS * 8
    }
}

/// A decoded `(header, tag)` pair from a data blob.
///
/// Renders as `header:tag` with spaces in the tag replaced by underscores,
/// the same shape the query syntax accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Suggestion {
    pub header: String,
    pub tag: String,
}

impl Suggestion {
    pub fn new(header: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.header, self.tag.replace(' ', "_"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
