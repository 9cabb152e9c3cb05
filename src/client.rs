//! Client facade — one object owning the search engine, the shard resolver
//! and the fetcher they share.
//!
//! The control script is fetched from the index host and refreshed on demand
//! when [`Client::file_url`] finds it older than the configured interval. A
//! failed refresh is logged and the stale state keeps serving.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use pagetree_core::script::hash_bucket;
use pagetree_core::{
    parse_script, Config, Fetch, FetchError, IndexSearch, SearchError, SearchOptions,
    ShardControlState, ShardResolver, Suggestion,
};

/// Failures surfaced by [`Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// The script downloaded but carried no case labels or no path prefix.
    #[error("control script at {url} has no usable shard table")]
    ScriptRejected { url: String },

    /// No control script has ever been installed.
    #[error("no control script loaded")]
    ScriptUnavailable,

    /// Content hashes need at least three trailing hex characters.
    #[error("invalid content hash {0:?}")]
    InvalidHash(String),
}

/// Entry point for searches and content addressing.
pub struct Client<F> {
    search: IndexSearch<F>,
    resolver: ShardResolver,
    script_url: String,
    content_domain: String,
    reader_base: String,
    refresh_interval: Option<Duration>,
    refresh_lock: Mutex<()>,
}

impl<F: Fetch> Client<F> {
    pub fn new(fetcher: F, config: &Config) -> Self {
        let search = IndexSearch::new(fetcher, SearchOptions::from(config));
        let script_url = search.endpoints().resource_url(&config.script.path);
        Self {
            search,
            resolver: ShardResolver::new(),
            script_url,
            content_domain: config.remote.content_domain.clone(),
            reader_base: config.remote.reader_base.trim_end_matches('/').to_string(),
            refresh_interval: config.script.refresh_interval(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn search(&self) -> &IndexSearch<F> {
        &self.search
    }

    pub fn resolver(&self) -> &ShardResolver {
        &self.resolver
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    pub async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, ClientError> {
        Ok(self.search.suggest(query).await?)
    }

    /// Fetch, parse and install the control script. On rejection the held
    /// state is left untouched.
    pub async fn update_script(&self) -> Result<Arc<ShardControlState>, ClientError> {
        tracing::debug!(url = %self.script_url, "fetching control script");
        let body = self.search.fetcher().fetch(&self.script_url).await?;
        let text = String::from_utf8_lossy(&body);

        let Some(state) = parse_script(&text) else {
            return Err(ClientError::ScriptRejected {
                url: self.script_url.clone(),
            });
        };
        tracing::debug!(
            members = state.members(),
            prefix = state.path_prefix(),
            polarity = state.polarity(),
            "control script installed"
        );
        self.resolver.install(state).await;
        self.resolver
            .current()
            .await
            .ok_or(ClientError::ScriptUnavailable)
    }

    /// Download URL of the content file with `hash`.
    pub async fn file_url(&self, hash: &str) -> Result<String, ClientError> {
        if hash_bucket(hash).is_none() {
            return Err(ClientError::InvalidHash(hash.to_string()));
        }

        self.refresh_if_stale().await;
        let state = self
            .resolver
            .current()
            .await
            .ok_or(ClientError::ScriptUnavailable)?;

        let path = state.full_path(hash);
        let probe = format!("https://a.{}/webp/{}", self.content_domain, path);
        let shard = state.shard_letter(&probe, "a");
        Ok(format!(
            "https://{}.{}/webp/{}.webp",
            shard, self.content_domain, path
        ))
    }

    /// `Referer` a content download for `item_id` must carry.
    pub fn referer(&self, item_id: impl Display) -> String {
        format!("{}/{}.html", self.reader_base, item_id)
    }

    pub async fn script_age(&self) -> Option<Duration> {
        self.resolver.age().await
    }

    async fn refresh_if_stale(&self) {
        let Some(interval) = self.refresh_interval else {
            return;
        };
        if !self.resolver.is_stale(interval).await {
            return;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if !self.resolver.is_stale(interval).await {
            return;
        }
        if let Err(err) = self.update_script().await {
            tracing::warn!(
                url = %self.script_url,
                error = %err,
                "control script refresh failed, keeping previous state"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
