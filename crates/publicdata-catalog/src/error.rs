//! Error types for catalog and data-layout operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors produced while resolving dataset destinations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A destination resolved outside the pinned raw-data root.
    #[error("destination outside the raw data root")]
    DestinationOutsideRoot {
        /// Destination after normalization.
        requested: PathBuf,
        /// Raw-data root the destination must live under.
        root: PathBuf,
    },
    /// IO failure while preparing a destination.
    #[error("catalog io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}
