//! Test builders — control scripts, configs and ready-to-use clients.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use std::sync::Arc;

use pagetree::{Client, Config, HttpFetcher, IndexSearch, SearchOptions};
use pagetree_core::fixtures::MemoryFetcher;

use super::fixtures::CONTENT_DOMAIN;

// ---------------------------------------------------------------------------
// ScriptBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for control script text in the shape the content host
/// serves it: a `switch` over member ids, a bucket function and a path prefix.
///
/// # Example
///
/// ```rust
/// let script = ScriptBuilder::new()
///     .cases([1180, 2000])
///     .polarity(1)
///     .prefix("1712345678/")
///     .build();
/// ```
pub struct ScriptBuilder {
    cases: Vec<u32>,
    polarity: u8,
    prefix: Option<String>,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self {
            cases: Vec::new(),
            polarity: 0,
            prefix: Some("1712345678/".to_string()),
        }
    }

    pub fn cases(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.cases.extend(ids);
        self
    }

    pub fn polarity(mut self, polarity: u8) -> Self {
        assert!(polarity <= 1, "polarity must be 0 or 1");
        self.polarity = polarity;
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn without_prefix(mut self) -> Self {
        self.prefix = None;
        self
    }

    pub fn build(self) -> String {
        let default = 1 - self.polarity;
        let mut out = String::from("'use strict';\ngg = { m: function(g) { var o = ");
        out.push_str(&format!("{default}; switch (g) {{ "));
        for id in &self.cases {
            out.push_str(&format!("case {id}:\n"));
        }
        if !self.cases.is_empty() {
            out.push_str(&format!(" o = {}; break; ", self.polarity));
        }
        out.push_str("} return o; }, ");
        out.push_str("s: function(h) { var m = /(..)(.)$/.exec(h); ");
        out.push_str("return parseInt(m[2]+m[1], 16).toString(10); }");
        if let Some(prefix) = &self.prefix {
            out.push_str(&format!(", b: '{prefix}'"));
        }
        out.push_str(" };\n");
        out
    }
}

// ---------------------------------------------------------------------------
// Config and client constructors
// ---------------------------------------------------------------------------

/// Defaults pointed at `index_base`, with the test content domain.
pub fn test_config(index_base: &str) -> Config {
    let mut cfg = Config::defaults();
    cfg.remote.index_base = index_base.to_string();
    cfg.remote.content_domain = CONTENT_DOMAIN.to_string();
    cfg.remote.reader_base = format!("https://{CONTENT_DOMAIN}/reader");
    cfg.fetch.timeout_ms = 5_000;
    cfg
}

pub fn http_fetcher() -> HttpFetcher {
    HttpFetcher::new(std::time::Duration::from_secs(5), "pagetree-harness/1")
        .expect("test fetcher")
}

/// Engine over HTTP against `base`.
pub fn http_search(base: &str, whole_index: bool) -> IndexSearch<HttpFetcher> {
    IndexSearch::new(http_fetcher(), SearchOptions::new(base))
        .with_whole_index_caching(whole_index)
}

/// Client over the in-memory fetcher, returning both so tests can mutate the
/// remote side.
pub fn memory_client(cfg: &Config) -> (Client<Arc<MemoryFetcher>>, Arc<MemoryFetcher>) {
    let fetcher = Arc::new(MemoryFetcher::new());
    (Client::new(fetcher.clone(), cfg), fetcher)
}

