//! Shared client construction and the default request headers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};

use crate::download::{self, DownloadOptions};
use crate::error::{HttpError, HttpResult};
use crate::fetch;
use crate::retry::RetryPolicy;

/// Identifying user agent advertised on every request.
pub const DEFAULT_USER_AGENT: &str =
    "publicdata-ca/0.1.0 (Canadian public dataset acquisition toolkit)";

/// Default per-request timeout applied at client construction.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default headers applied to every outgoing request.
#[must_use]
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers
}

/// Configured HTTP client shared by fetch and download operations.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client with the default headers and timeout.
    pub fn new() -> HttpResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> HttpResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers())
            .build()
            .map_err(|source| HttpError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Fetch `url` with retries according to `policy`.
    ///
    /// Returns the first non-error response; 5xx, 429, and 408 statuses are
    /// retried with doubled delays, other 4xx statuses fail immediately.
    pub async fn fetch(&self, url: &str, policy: &RetryPolicy) -> HttpResult<Response> {
        fetch::fetch_with_retry(&self.client, url, policy, None).await
    }

    /// Fetch with extra headers layered over the client defaults.
    pub async fn fetch_with_headers(
        &self,
        url: &str,
        policy: &RetryPolicy,
        headers: &HeaderMap,
    ) -> HttpResult<Response> {
        fetch::fetch_with_retry(&self.client, url, policy, Some(headers)).await
    }

    /// Fetch `url` and decode the response body as text.
    pub async fn fetch_text(&self, url: &str, policy: &RetryPolicy) -> HttpResult<String> {
        let response = self.fetch(url, policy).await?;
        response
            .text()
            .await
            .map_err(|source| HttpError::transport(url, source))
    }

    /// Stream `url` into `destination` according to `options`.
    pub async fn download(
        &self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
    ) -> HttpResult<PathBuf> {
        download::download_to_path(self, url, destination, options).await
    }
}
