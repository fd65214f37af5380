//! Error types for provider adapters and the registry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use zip::result::ZipError;

use publicdata_http::HttpError;
use publicdata_resolve::error::ResolveError;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors produced while searching for and fetching datasets.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No provider is registered under the requested name.
    #[error("unknown provider")]
    UnknownProvider {
        /// Name that failed the registry lookup.
        name: String,
    },
    /// The table identifier does not reduce to an 8-digit product id.
    #[error("invalid statcan table id")]
    InvalidPid {
        /// Identifier as supplied by the caller.
        input: String,
    },
    /// The language is not one the providers publish in.
    #[error("unsupported language")]
    UnsupportedLanguage {
        /// Language value as supplied by the caller.
        input: String,
    },
    /// Landing page resolution produced no usable assets.
    #[error("no matching assets on landing page")]
    NoAssets {
        /// Landing page that was resolved.
        landing_url: String,
        /// Filter in effect when resolution came up empty.
        filter: Option<String>,
    },
    /// A table acquisition failed partway through.
    #[error("statcan table fetch failed")]
    StatCanTable {
        /// Product id of the table being fetched.
        pid: String,
        /// Underlying failure.
        source: Box<ProviderError>,
    },
    /// The downloaded archive could not be decoded.
    #[error("provider archive failure")]
    Zip {
        /// Operation that triggered the archive failure.
        operation: &'static str,
        /// Archive path involved.
        path: PathBuf,
        /// Underlying archive error.
        source: ZipError,
    },
    /// An archive entry would extract outside the output directory.
    #[error("unsafe archive entry path")]
    UnsafeArchivePath {
        /// Entry name as recorded in the archive.
        entry: String,
    },
    /// IO failure while managing provider files on disk.
    #[error("provider io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Failure in the HTTP acquisition layer.
    #[error("provider http failure")]
    Http {
        /// Underlying acquisition error.
        source: HttpError,
    },
    /// Failure while scanning a landing page for assets.
    #[error("provider resolve failure")]
    Resolve {
        /// Underlying resolver error.
        source: ResolveError,
    },
}

impl ProviderError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(operation: &'static str, path: impl Into<PathBuf>, source: ZipError) -> Self {
        Self::Zip {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn http(source: HttpError) -> Self {
        Self::Http { source }
    }

    pub(crate) const fn resolve(source: ResolveError) -> Self {
        Self::Resolve { source }
    }

    pub(crate) fn statcan(pid: impl Into<String>, source: Self) -> Self {
        Self::StatCanTable {
            pid: pid.into(),
            source: Box::new(source),
        }
    }
}
