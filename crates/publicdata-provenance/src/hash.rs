//! Chunked file hashing with a small algorithm registry.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::digest::Output;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{ProvenanceError, ProvenanceResult};

/// Read size used when hashing, so large tables never occupy memory whole.
pub const HASH_CHUNK_SIZE: usize = 8192;

/// Hash algorithms a sidecar may record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, the default for new records.
    #[default]
    Sha256,
    /// SHA-512 for callers that want the wider digest.
    Sha512,
}

impl HashAlgorithm {
    /// Canonical lowercase name recorded in sidecars.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ProvenanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ProvenanceError::UnsupportedAlgorithm {
                algorithm: value.to_string(),
            }),
        }
    }
}

/// Hash `path` with `algorithm`, returning the lowercase hex digest.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> ProvenanceResult<String> {
    match algorithm {
        HashAlgorithm::Sha256 => digest_file::<Sha256>(path),
        HashAlgorithm::Sha512 => digest_file::<Sha512>(path),
    }
}

fn digest_file<D>(path: &Path) -> ProvenanceResult<String>
where
    D: Digest,
    Output<D>: fmt::LowerHex,
{
    let file = File::open(path).map_err(|source| ProvenanceError::io("hash.open", path, source))?;
    let mut reader = BufReader::with_capacity(HASH_CHUNK_SIZE, file);
    let mut hasher = D::new();
    let mut buffer = [0_u8; HASH_CHUNK_SIZE];
    loop {
        let count = reader
            .read(&mut buffer)
            .map_err(|source| ProvenanceError::io("hash.read", path, source))?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
