//! HTTP(S) implementation of [`Fetch`] on the hyper legacy client.
//!
//! Ranged fetches send `Range: bytes=start-end`. A server that ignores the
//! header and answers `200` with the whole body gets sliced locally, so callers
//! always receive the bytes they asked for.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header::{HeaderValue, InvalidHeaderValue, RANGE, USER_AGENT};
use hyper::{Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use pagetree_core::config::FetchConfig;
use pagetree_core::{Fetch, FetchError};

type HttpsClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Failure to construct an [`HttpFetcher`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid user agent: {0}")]
    InvalidUserAgent(#[from] InvalidHeaderValue),
}

/// [`Fetch`] over HTTP/1.1, with TLS for `https` URLs.
#[derive(Clone)]
pub struct HttpFetcher {
    client: HttpsClient,
    timeout: Duration,
    user_agent: HeaderValue,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Every request, body included, must finish within `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, BuildError> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            timeout,
            user_agent: HeaderValue::from_str(user_agent)?,
        })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, BuildError> {
        Self::new(config.timeout(), &config.user_agent)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get(&self, url: &str, range: Option<(u64, u64)>) -> Result<Bytes, FetchError> {
        let transport = |message: String| FetchError::Transport {
            url: url.to_string(),
            message,
        };

        let uri: Uri = url
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| transport(e.to_string()))?;
        let mut request = Request::get(uri).header(USER_AGENT, self.user_agent.clone());
        if let Some((start, end)) = range {
            request = request.header(RANGE, format!("bytes={start}-{end}"));
        }
        let request = request
            .body(Empty::<Bytes>::new())
            .map_err(|e| transport(e.to_string()))?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Remote {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| transport(e.to_string()))?
                .to_bytes();
            Ok::<_, FetchError>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(%url, timeout = ?self.timeout, "request timed out");
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        match range {
            Some((start, end)) if status == StatusCode::OK => {
                tracing::debug!(%url, "server ignored Range, slicing full body");
                slice_inclusive(url, body, start, end)
            }
            _ => Ok(body),
        }
    }
}

fn slice_inclusive(url: &str, body: Bytes, start: u64, end: u64) -> Result<Bytes, FetchError> {
    let len = body.len() as u64;
    if start >= len || end < start {
        return Err(FetchError::Remote {
            url: url.to_string(),
            status: StatusCode::RANGE_NOT_SATISFIABLE.as_u16(),
        });
    }
    let stop = end.saturating_add(1).min(len);
    Ok(body.slice(start as usize..stop as usize))
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        tracing::debug!(%url, "GET");
        self.get(url, None).await
    }

    async fn fetch_range(&self, url: &str, start: u64, end: u64) -> Result<Bytes, FetchError> {
        tracing::debug!(%url, start, end, "GET range");
        self.get(url, Some((start, end))).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
