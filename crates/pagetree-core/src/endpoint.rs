//! Index classes and the URLs of their versioned files.
//!
//! Every index class lives under its own directory on the index host and
//! publishes a `version` endpoint plus an `index`/`data` file pair named after
//! the current version token:
//!
//! ```text
//! <base>/<dir>/version?_=<millis>
//! <base>/<dir>/<stem>.<version>.index
//! <base>/<dir>/<stem>.<version>.data
//! ```

use std::fmt;

use phf::phf_map;

/// The remote index families. Each has its own version token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexClass {
    Galleries,
    Languages,
    NozomiUrl,
    /// Catch-all: one file pair per field, named after the field.
    Tags,
}

static FIXED_FIELDS: phf::Map<&'static str, IndexClass> = phf_map! {
    "galleries" => IndexClass::Galleries,
    "languages" => IndexClass::Languages,
    "nozomiurl" => IndexClass::NozomiUrl,
};

impl IndexClass {
    /// Class serving `field`; any field without a dedicated class is a tag
    /// field.
    pub fn for_field(field: &str) -> Self {
        FIXED_FIELDS.get(field).copied().unwrap_or(IndexClass::Tags)
    }

    pub fn name(self) -> &'static str {
        match self {
            IndexClass::Galleries => "galleries",
            IndexClass::Languages => "languages",
            IndexClass::NozomiUrl => "nozomiurl",
            IndexClass::Tags => "tag",
        }
    }

    /// Directory on the index host.
    pub fn dir(self) -> &'static str {
        match self {
            IndexClass::Galleries => "galleriesindex",
            IndexClass::Languages => "languagesindex",
            IndexClass::NozomiUrl => "nozomiurlindex",
            IndexClass::Tags => "tagindex",
        }
    }

    /// File name stem for `field` within this class.
    pub fn file_stem<'a>(self, field: &'a str) -> &'a str {
        match self {
            IndexClass::Tags => field,
            fixed => fixed.name(),
        }
    }
}

impl fmt::Display for IndexClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// URL builder rooted at the index host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Version endpoint with a cache-busting timestamp.
    pub fn version_url(&self, class: IndexClass, now_millis: i64) -> String {
        format!("{}/{}/version?_={}", self.base, class.dir(), now_millis)
    }

    pub fn index_url(&self, class: IndexClass, field: &str, version: &str) -> String {
        self.file_url(class, field, version, "index")
    }

    pub fn data_url(&self, class: IndexClass, field: &str, version: &str) -> String {
        self.file_url(class, field, version, "data")
    }

    /// Any other resource on the index host, e.g. the control script.
    pub fn resource_url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn file_url(&self, class: IndexClass, field: &str, version: &str, ext: &str) -> String {
        format!(
            "{}/{}/{}.{}.{}",
            self.base,
            class.dir(),
            class.file_stem(field),
            version,
            ext
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
