#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]
//! # Design
//!
//! - One configured `reqwest` client shared by every acquisition path, with
//!   an identifying user agent and a per-request timeout.
//! - Bounded retries with doubled delays: server errors, throttling (429),
//!   and request timeouts (408) are retryable; other client errors fail fast
//!   on the first attempt.
//! - Downloads stream chunk-by-chunk through a buffered writer so memory
//!   stays bounded by the chunk, never the payload.
//! - An optional content gate rejects HTML bodies served where a data file
//!   was expected, before any byte reaches disk.

mod client;
mod download;
mod error;
mod fetch;
mod retry;

pub use client::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpClient, default_headers};
pub use download::{DEFAULT_BUFFER_SIZE, DownloadOptions, is_html_content_type};
pub use error::{HttpError, HttpResult};
pub use fetch::is_retryable_status;
pub use retry::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES, RetryPolicy};

pub use reqwest::Response;
pub use reqwest::StatusCode;
pub use reqwest::header::HeaderMap;
