//! Sidecar records: write, read, verify.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{ProvenanceError, ProvenanceResult};
use crate::hash::{HashAlgorithm, hash_file};

/// Suffix appended to a data file's name to form its sidecar name.
pub const META_SUFFIX: &str = ".meta.json";

/// Hash entry recorded inside a provenance sidecar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileHash {
    /// Name of the algorithm that produced `value`. Old sidecars may omit
    /// it, in which case the original default applies.
    #[serde(default = "default_algorithm_name")]
    pub algorithm: String,
    /// Lowercase hex digest of the data file.
    pub value: String,
}

fn default_algorithm_name() -> String {
    HashAlgorithm::Sha256.as_str().to_string()
}

/// Provenance sidecar contents for a downloaded data file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvenanceRecord {
    /// Name of the data file the record describes.
    pub file: String,
    /// URL the data file was downloaded from.
    pub source_url: String,
    /// Download timestamp in UTC.
    pub downloaded_at: DateTime<Utc>,
    /// Size of the data file in bytes at download time.
    pub file_size_bytes: u64,
    /// Digest of the data file.
    pub hash: FileHash,
    /// Declared content type of the response, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Provider-specific fields merged into the record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Sidecar path for a data file: `table.csv` maps to `table.csv.meta.json`.
#[must_use]
pub fn sidecar_path(data_path: &Path) -> PathBuf {
    let mut name = data_path
        .file_name()
        .map_or_else(OsString::new, OsString::from);
    name.push(META_SUFFIX);
    data_path.with_file_name(name)
}

fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.ends_with(META_SUFFIX))
}

fn data_path_for(path: &Path) -> PathBuf {
    path.file_name()
        .and_then(OsStr::to_str)
        .and_then(|name| name.strip_suffix(META_SUFFIX))
        .map_or_else(|| path.to_path_buf(), |stem| path.with_file_name(stem))
}

/// Hash `data_path` and write its sidecar, replacing any existing one.
///
/// Base fields are composed first and `extra` merges last-wins, so callers
/// may both add provider context and shadow a base field when they need to.
/// Returns the sidecar path.
pub fn write_provenance(
    data_path: &Path,
    source_url: &str,
    content_type: Option<&str>,
    extra: &Map<String, Value>,
    algorithm: HashAlgorithm,
) -> ProvenanceResult<PathBuf> {
    if !data_path.is_file() {
        return Err(ProvenanceError::MissingDataFile {
            path: data_path.to_path_buf(),
        });
    }

    let size = fs::metadata(data_path)
        .map_err(|source| ProvenanceError::io("sidecar.stat", data_path, source))?
        .len();
    let digest = hash_file(data_path, algorithm)?;
    let file_name = data_path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string();

    let mut record = Map::new();
    record.insert("file".to_string(), Value::from(file_name));
    record.insert("source_url".to_string(), Value::from(source_url));
    record.insert(
        "downloaded_at".to_string(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    record.insert("file_size_bytes".to_string(), Value::from(size));
    record.insert(
        "hash".to_string(),
        json!({ "algorithm": algorithm.as_str(), "value": digest }),
    );
    if let Some(content_type) = content_type {
        record.insert("content_type".to_string(), Value::from(content_type));
    }
    for (key, value) in extra {
        record.insert(key.clone(), value.clone());
    }

    let sidecar = sidecar_path(data_path);
    let payload = serde_json::to_string_pretty(&Value::Object(record))
        .map_err(|source| ProvenanceError::json("sidecar.serialize", &sidecar, source))?;
    fs::write(&sidecar, payload)
        .map_err(|source| ProvenanceError::io("sidecar.write", &sidecar, source))?;

    debug!(path = %sidecar.display(), "wrote provenance sidecar");
    Ok(sidecar)
}

/// Read the sidecar for `path`, which may be the data file or the sidecar
/// itself.
pub fn read_provenance(path: &Path) -> ProvenanceResult<ProvenanceRecord> {
    let sidecar = if is_sidecar(path) {
        path.to_path_buf()
    } else {
        sidecar_path(path)
    };
    if !sidecar.is_file() {
        return Err(ProvenanceError::MissingSidecar { path: sidecar });
    }

    let contents = fs::read_to_string(&sidecar)
        .map_err(|source| ProvenanceError::io("sidecar.read", &sidecar, source))?;
    serde_json::from_str(&contents)
        .map_err(|source| ProvenanceError::json("sidecar.parse", &sidecar, source))
}

/// Recompute the digest of a data file and compare it with its sidecar.
///
/// Accepts the data path or the sidecar path. The recorded algorithm decides
/// what gets recomputed; an empty recorded value is an error rather than a
/// mismatch.
pub fn verify_file(path: &Path) -> ProvenanceResult<bool> {
    let record = read_provenance(path)?;
    let data_path = data_path_for(path);

    if record.hash.value.is_empty() {
        return Err(ProvenanceError::MissingHashValue {
            path: sidecar_path(&data_path),
        });
    }

    let algorithm: HashAlgorithm = record.hash.algorithm.parse()?;
    let actual = hash_file(&data_path, algorithm)?;
    Ok(actual.eq_ignore_ascii_case(&record.hash.value))
}
