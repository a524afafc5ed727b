//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable per-request timeout and User-Agent
//! - A single attempt per call (no retry)
//! - Status code mapping onto [`ResolveError`]

use crate::error::ResolveError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default timeout for HTTP requests and git subprocesses (20 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("pinbump/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ResolveError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| {
                ResolveError::network(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { client })
    }

    /// Perform a GET request, mapping error statuses
    ///
    /// Header names must be lowercase. `repo` and `backend` only feed error
    /// messages.
    pub async fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        repo: &str,
        backend: &str,
    ) -> Result<reqwest::Response, ResolveError> {
        let response = self
            .client
            .get(url)
            .headers(build_headers(headers, repo, backend)?)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolveError::timeout(repo, backend)
                } else {
                    ResolveError::network(repo, backend, e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ResolveError::not_found(repo, backend)),
            StatusCode::UNAUTHORIZED => Err(ResolveError::Unauthorized {
                repo: repo.to_string(),
                backend: backend.to_string(),
            }),
            StatusCode::FORBIDDEN => Err(ResolveError::Forbidden {
                repo: repo.to_string(),
                backend: backend.to_string(),
            }),
            status if !status.is_success() => Err(ResolveError::network(
                repo,
                backend,
                format!("HTTP {}", status),
            )),
            _ => Ok(response),
        }
    }

    /// Perform a GET request and parse the JSON body
    ///
    /// An empty body yields `Ok(None)`.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        repo: &str,
        backend: &str,
    ) -> Result<Option<T>, ResolveError> {
        let response = self.get(url, headers, repo, backend).await?;

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ResolveError::timeout(repo, backend)
            } else {
                ResolveError::invalid_response(repo, backend, e.to_string())
            }
        })?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| {
                ResolveError::invalid_response(repo, backend, format!("failed to parse JSON: {}", e))
            })
    }
}

fn build_headers(
    headers: &[(&'static str, String)],
    repo: &str,
    backend: &str,
) -> Result<HeaderMap, ResolveError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|_| {
            ResolveError::network(repo, backend, format!("invalid value for header {}", name))
        })?;
        map.insert(HeaderName::from_static(*name), value);
    }
    Ok(map)
}
