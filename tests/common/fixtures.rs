//! Static corpora used across harnesses.
//!
//! `TAG_CORPUS` is a small but multi-level index: with `max_keys(2)` its
//! terms pack into a tree at least three pages deep, so every harness that
//! uses it exercises real descent.

use pagetree_core::fixtures::IndexFixture;

/// Version token the fake servers publish.
pub const VERSION: &str = "1700000000";

/// Content domain used in client configs.
pub const CONTENT_DOMAIN: &str = "content.test";

/// A real-looking 64-character content hash whose bucket is 1180.
pub const SAMPLE_HASH: &str = "bd950fbb6310a70d790082d194a282c3585a3a87b19ed4df7f8320ad965829c4";

/// Bucket of [`SAMPLE_HASH`].
pub const SAMPLE_BUCKET: u32 = 1180;

/// `(term, [(header, tag)])` entries for the `female` tag field.
pub const TAG_CORPUS: &[(&str, &[(&str, &str)])] = &[
    ("glasses", &[("female", "glasses")]),
    ("big breasts", &[("female", "big breasts")]),
    ("ponytail", &[("female", "ponytail")]),
    ("stockings", &[("female", "stockings")]),
    ("twintails", &[("female", "twintails")]),
    ("maid", &[("female", "maid"), ("tag", "maid")]),
    ("nurse", &[("female", "nurse")]),
    ("schoolgirl uniform", &[("female", "schoolgirl uniform")]),
    ("sole female", &[("female", "sole female")]),
    ("kimono", &[("female", "kimono")]),
    ("swimsuit", &[("female", "swimsuit"), ("female", "school swimsuit")]),
    ("dark skin", &[("female", "dark skin")]),
    ("elf", &[("female", "elf")]),
    ("tail", &[("female", "tail")]),
    ("", &[("female", "")]),
];

/// Terms that are not in [`TAG_CORPUS`].
pub const ABSENT_TERMS: &[&str] = &["tentacles", "glasses ", "GLASSES", "big_breasts"];

/// `TAG_CORPUS` packed two keys per page.
pub fn tag_index() -> IndexFixture {
    TAG_CORPUS
        .iter()
        .fold(IndexFixture::builder().max_keys(2), |b, (term, suggestions)| {
            b.term(term, suggestions)
        })
        .build()
}

/// A second, disjoint index used for the `languages` class.
pub fn language_index() -> IndexFixture {
    IndexFixture::builder()
        .term("english", &[("language", "english")])
        .term("japanese", &[("language", "japanese")])
        .term("chinese", &[("language", "chinese")])
        .build()
}
