//! # Design
//!
//! - Structured, constant-message errors for provenance operations.
//! - Carry the offending path so failures reproduce in tests without
//!   parsing message strings.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for provenance operations.
pub type ProvenanceResult<T> = Result<T, ProvenanceError>;

/// Errors produced while hashing files and handling sidecars.
#[derive(Debug, Error)]
pub enum ProvenanceError {
    /// The data file to describe or verify does not exist.
    #[error("provenance data file missing")]
    MissingDataFile {
        /// Path of the absent data file.
        path: PathBuf,
    },
    /// The sidecar for a data file does not exist.
    #[error("provenance sidecar missing")]
    MissingSidecar {
        /// Path of the absent sidecar.
        path: PathBuf,
    },
    /// IO failure while reading or writing files.
    #[error("provenance io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// JSON parsing or serialization failure for a sidecar.
    #[error("provenance json failure")]
    Json {
        /// Operation that triggered the JSON failure.
        operation: &'static str,
        /// Path involved in the JSON failure.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A sidecar names a hash algorithm this build cannot compute.
    #[error("provenance unsupported hash algorithm")]
    UnsupportedAlgorithm {
        /// Algorithm name recorded in the sidecar.
        algorithm: String,
    },
    /// A sidecar carries an empty hash value, so there is nothing to verify.
    #[error("provenance missing hash value")]
    MissingHashValue {
        /// Path of the sidecar with the empty hash.
        path: PathBuf,
    },
}

impl ProvenanceError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            operation,
            path: path.into(),
            source,
        }
    }
}
