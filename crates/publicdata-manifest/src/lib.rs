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
#![allow(clippy::module_name_repetitions)]
//! Run manifests: a JSON record of what a batch of fetches produced, written
//! into the output directory and checkable later.
//!
//! # Design
//! - Dataset records pass through verbatim; the manifest never reshapes what
//!   providers reported, so new provider fields need no support here.
//! - File entries are stored relative to the output directory, which is
//!   where the manifest itself lives, so validation resolves them against
//!   the manifest's own parent.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ManifestError, ManifestResult};

pub mod error;

/// File name used when the caller does not pick one.
pub const DEFAULT_MANIFEST_NAME: &str = "manifest.json";

/// Manifest describing one batch of dataset fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    /// When the manifest was written, UTC.
    pub created_at: DateTime<Utc>,
    /// Dataset result records, verbatim as reported by providers.
    pub datasets: Vec<Value>,
    /// Number of dataset records.
    pub total_datasets: usize,
    /// Absolute output directory the batch wrote into.
    pub output_directory: PathBuf,
}

/// Write a run manifest for `datasets` into `output_dir` under `file_name`,
/// creating the directory when necessary. Returns the manifest path.
pub fn build_run_manifest(
    output_dir: &Path,
    datasets: &[Value],
    file_name: &str,
) -> ManifestResult<PathBuf> {
    fs::create_dir_all(output_dir)
        .map_err(|source| ManifestError::io("manifest.create_dir", output_dir, source))?;

    let output_directory = std::path::absolute(output_dir)
        .map_err(|source| ManifestError::io("manifest.absolutize", output_dir, source))?;
    let manifest = RunManifest {
        created_at: Utc::now(),
        datasets: datasets.to_vec(),
        total_datasets: datasets.len(),
        output_directory,
    };

    let manifest_path = output_dir.join(file_name);
    let payload = serde_json::to_string_pretty(&manifest)
        .map_err(|source| ManifestError::json("manifest.serialize", &manifest_path, source))?;
    fs::write(&manifest_path, payload)
        .map_err(|source| ManifestError::io("manifest.write", &manifest_path, source))?;

    Ok(manifest_path)
}

/// Load a run manifest from `path`.
pub fn load_manifest(path: &Path) -> ManifestResult<RunManifest> {
    let contents = fs::read_to_string(path)
        .map_err(|source| ManifestError::io("manifest.read", path, source))?;
    serde_json::from_str(&contents)
        .map_err(|source| ManifestError::json("manifest.parse", path, source))
}

/// List every file named by the manifest at `path` that no longer exists,
/// resolving entries against the manifest's directory.
///
/// Each absence is logged as it is found. Records without a `files` array
/// contribute nothing.
pub fn missing_files(path: &Path) -> ManifestResult<Vec<PathBuf>> {
    let manifest = load_manifest(path)?;
    let base = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let mut missing = Vec::new();
    for dataset in &manifest.datasets {
        let dataset_id = dataset
            .get("dataset_id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");
        let Some(files) = dataset.get("files").and_then(Value::as_array) else {
            continue;
        };
        for file in files {
            let Some(name) = file.as_str() else {
                continue;
            };
            let candidate = base.join(name);
            if !candidate.is_file() {
                warn!(dataset_id, path = %candidate.display(), "manifest lists a missing file");
                missing.push(candidate);
            }
        }
    }

    Ok(missing)
}

/// Check that every file listed by every dataset record still exists.
///
/// Convenience wrapper over [`missing_files`]: `Ok(false)` when any entry
/// is absent.
pub fn validate_manifest(path: &Path) -> ManifestResult<bool> {
    Ok(missing_files(path)?.is_empty())
}
