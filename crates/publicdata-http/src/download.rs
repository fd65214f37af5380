//! Streaming download to disk with an optional HTML content gate.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use tracing::debug;

use crate::client::HttpClient;
use crate::error::{HttpError, HttpResult};
use crate::retry::RetryPolicy;

/// Default capacity of the buffered writer receiving body chunks.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Options controlling a streaming download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Retry schedule for the underlying fetch.
    pub retry: RetryPolicy,
    /// Extra headers layered over the client defaults.
    pub headers: HeaderMap,
    /// Reject responses that declare an HTML content type. Portals routinely
    /// serve an HTML error or login page with status 200 where a data file
    /// was expected.
    pub validate_content_type: bool,
    /// Capacity of the buffered writer receiving body chunks.
    pub buffer_size: usize,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            headers: HeaderMap::new(),
            validate_content_type: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl DownloadOptions {
    /// Options with the HTML content gate enabled.
    #[must_use]
    pub fn validated() -> Self {
        Self {
            validate_content_type: true,
            ..Self::default()
        }
    }
}

/// True when a `Content-Type` value names an HTML or XHTML document.
#[must_use]
pub fn is_html_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    lowered.contains("text/html") || lowered.contains("application/xhtml+xml")
}

pub(crate) async fn download_to_path(
    client: &HttpClient,
    url: &str,
    destination: &Path,
    options: &DownloadOptions,
) -> HttpResult<PathBuf> {
    let response = client
        .fetch_with_headers(url, &options.retry, &options.headers)
        .await?;

    if options.validate_content_type {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if is_html_content_type(content_type) {
            return Err(HttpError::ContentType {
                url: url.to_string(),
                content_type: content_type.to_string(),
            });
        }
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|source| HttpError::io("download.create_parent", parent, source))?;
        }
    }

    let file = File::create(destination)
        .map_err(|source| HttpError::io("download.create_file", destination, source))?;
    let mut writer = BufWriter::with_capacity(options.buffer_size, file);

    let mut stream = response.bytes_stream();
    let mut written: usize = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| HttpError::transport(url, source))?;
        writer
            .write_all(&chunk)
            .map_err(|source| HttpError::io("download.write_chunk", destination, source))?;
        written = written.saturating_add(chunk.len());
    }

    writer
        .flush()
        .map_err(|source| HttpError::io("download.flush", destination, source))?;

    debug!(url, path = %destination.display(), bytes = written, "download complete");
    Ok(destination.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn options_with_one_attempt(validate: bool) -> DownloadOptions {
        DownloadOptions {
            retry: RetryPolicy {
                max_retries: 1,
                initial_delay: Duration::from_millis(5),
            },
            validate_content_type: validate,
            ..DownloadOptions::default()
        }
    }

    #[test]
    fn html_content_types_are_recognized() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("Text/HTML; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("text/csv"));
        assert!(!is_html_content_type("application/zip"));
        assert!(!is_html_content_type(""));
    }

    #[tokio::test]
    async fn html_response_is_rejected_before_any_write() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/portal");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html><body>Please sign in</body></html>");
        });

        let temp = TempDir::new().expect("tempdir");
        let destination = temp.path().join("table.csv");

        let client = HttpClient::new().expect("client");
        let err = client
            .download(
                &server.url("/portal"),
                &destination,
                &options_with_one_attempt(true),
            )
            .await
            .expect_err("html body should be rejected");

        assert!(matches!(err, HttpError::ContentType { .. }));
        assert!(!destination.exists(), "no file should be written");
    }

    #[tokio::test]
    async fn html_body_is_written_when_validation_is_off() {
        let body = "<html><body>still data to someone</body></html>";
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/page");
            then.status(200)
                .header("content-type", "text/html")
                .body(body);
        });

        let temp = TempDir::new().expect("tempdir");
        let destination = temp.path().join("page.txt");

        let client = HttpClient::new().expect("client");
        let written = client
            .download(
                &server.url("/page"),
                &destination,
                &options_with_one_attempt(false),
            )
            .await
            .expect("download should succeed");

        assert_eq!(written, destination);
        let contents = fs::read_to_string(&destination).expect("read download");
        assert_eq!(contents, body);
    }

    #[tokio::test]
    async fn body_streams_to_destination_byte_for_byte() {
        let body: Vec<u8> = (0_u16..2048).map(|n| u8::try_from(n % 251).expect("byte")).collect();
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/blob.dat");
            then.status(200)
                .header("content-type", "application/octet-stream")
                .body(body.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        let destination = temp.path().join("blob.dat");

        let client = HttpClient::new().expect("client");
        client
            .download(
                &server.url("/blob.dat"),
                &destination,
                &options_with_one_attempt(true),
            )
            .await
            .expect("download should succeed");

        assert_eq!(fs::read(&destination).expect("read download"), body);
    }

    #[tokio::test]
    async fn missing_parent_directories_are_created() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/nested.csv");
            then.status(200).body("x\n");
        });

        let temp = TempDir::new().expect("tempdir");
        let destination = temp.path().join("raw").join("cpi").join("nested.csv");

        let client = HttpClient::new().expect("client");
        client
            .download(
                &server.url("/nested.csv"),
                &destination,
                &options_with_one_attempt(false),
            )
            .await
            .expect("download should succeed");

        assert!(destination.is_file());
    }

    #[tokio::test]
    async fn existing_destination_is_overwritten() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/fresh.csv");
            then.status(200).body("new\n");
        });

        let temp = TempDir::new().expect("tempdir");
        let destination = temp.path().join("fresh.csv");
        fs::write(&destination, "old contents that are longer\n").expect("seed file");

        let client = HttpClient::new().expect("client");
        client
            .download(
                &server.url("/fresh.csv"),
                &destination,
                &options_with_one_attempt(false),
            )
            .await
            .expect("download should succeed");

        assert_eq!(
            fs::read_to_string(&destination).expect("read download"),
            "new\n"
        );
    }
}
