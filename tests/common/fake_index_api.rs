//! Fake index host for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Every path is served from an in-memory table by a single
//! fallback handler:
//! - `Range: bytes=a-b` answers `206` with the inclusive slice, `416` when
//!   `a` is past the end
//! - no `Range` answers `200` with the whole body
//! - unknown paths answer `404`; paths marked with [`FakeIndexApi::fail`]
//!   answer the given status
//!
//! Query strings are ignored for lookup, so the cache-busted version URL
//! resolves to its plain path. Every request is counted per path.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeIndexApi::start().await.unwrap();
//! api.install_index(&tag_index(), "female", VERSION).await;
//! let search = http_search(&api.base_url(), false);
//! ```

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use pagetree::Endpoints;
use pagetree_core::fixtures::IndexFixture;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// State shared between the router and test code.
#[derive(Default)]
struct ApiState {
    files: HashMap<String, Bytes>,
    failures: HashMap<String, StatusCode>,
    hits: HashMap<String, usize>,
    ranged_hits: usize,
    latency: Duration,
}

type Shared = Arc<Mutex<ApiState>>;

/// Handle to the running fake index host.
pub struct FakeIndexApi {
    addr: SocketAddr,
    state: Shared,
}

impl FakeIndexApi {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Shared::default();

        let app = Router::new().fallback(serve_file).with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Base URL (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(self.base_url())
    }

    /// Serve `body` at `path` (leading `/` included).
    pub async fn put(&self, path: &str, body: impl Into<Bytes>) {
        self.state
            .lock()
            .await
            .files
            .insert(path.to_string(), body.into());
    }

    /// Publish `fixture` as the current `version` of `field`'s index.
    pub async fn install_index(&self, fixture: &IndexFixture, field: &str, version: &str) {
        let base = self.base_url();
        for (url, body) in fixture.files(&self.endpoints(), field, version) {
            let path = url.strip_prefix(&base).unwrap_or(&url).to_string();
            self.put(&path, body).await;
        }
    }

    /// Answer every request for `path` with `status` until cleared.
    pub async fn fail(&self, path: &str, status: u16) {
        let status = StatusCode::from_u16(status).expect("valid status");
        self.state
            .lock()
            .await
            .failures
            .insert(path.to_string(), status);
    }

    pub async fn clear_failure(&self, path: &str) {
        self.state.lock().await.failures.remove(path);
    }

    /// Delay every response by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.state.lock().await.latency = latency;
    }

    /// Requests seen for `path`.
    pub async fn hits(&self, path: &str) -> usize {
        self.state.lock().await.hits.get(path).copied().unwrap_or(0)
    }

    /// Requests that carried a `Range` header, across all paths.
    pub async fn ranged_hits(&self) -> usize {
        self.state.lock().await.ranged_hits
    }
}

// ---------------------------------------------------------------------------
// Route handler
// ---------------------------------------------------------------------------

fn parse_range(headers: &HeaderMap) -> Option<(usize, usize)> {
    let raw = headers.get(header::RANGE)?.to_str().ok()?;
    let (start, end) = raw.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

async fn serve_file(State(state): State<Shared>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    let range = parse_range(&headers);

    let (latency, failure, body) = {
        let mut state = state.lock().await;
        *state.hits.entry(path.clone()).or_default() += 1;
        if range.is_some() {
            state.ranged_hits += 1;
        }
        (
            state.latency,
            state.failures.get(&path).copied(),
            state.files.get(&path).cloned(),
        )
    };

    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    if let Some(status) = failure {
        return status.into_response();
    }
    let Some(body) = body else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match range {
        Some((start, _)) if start >= body.len() => {
            StatusCode::RANGE_NOT_SATISFIABLE.into_response()
        }
        Some((start, end)) => {
            let end = end.saturating_add(1).min(body.len());
            (StatusCode::PARTIAL_CONTENT, body.slice(start..end)).into_response()
        }
        None => body.into_response(),
    }
}
