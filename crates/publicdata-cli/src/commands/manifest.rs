//! `manifest`: record a batch of dataset results and check a recorded batch
//! against the files on disk.

use std::fs;

use anyhow::anyhow;
use serde_json::Value;

use publicdata_manifest::{DEFAULT_MANIFEST_NAME, build_run_manifest, load_manifest, missing_files};

use crate::cli::{ManifestCreateArgs, ManifestValidateArgs};
use crate::client::{CliError, CliResult};

pub(crate) fn handle_manifest_create(args: &ManifestCreateArgs) -> CliResult<()> {
    let raw = fs::read_to_string(&args.datasets_file).map_err(|err| {
        CliError::validation(format!(
            "cannot read datasets file '{}': {err}",
            args.datasets_file.display()
        ))
    })?;
    let datasets: Vec<Value> = serde_json::from_str(&raw).map_err(|err| {
        CliError::validation(format!(
            "datasets file '{}' is not a JSON array of dataset records: {err}",
            args.datasets_file.display()
        ))
    })?;

    let manifest_path = build_run_manifest(&args.output, &datasets, DEFAULT_MANIFEST_NAME)
        .map_err(CliError::failure)?;
    println!(
        "Manifest for {} dataset(s) written to {}",
        datasets.len(),
        manifest_path.display()
    );
    Ok(())
}

pub(crate) fn handle_manifest_validate(args: &ManifestValidateArgs) -> CliResult<()> {
    let manifest = load_manifest(&args.manifest_file).map_err(CliError::failure)?;
    let missing = missing_files(&args.manifest_file).map_err(CliError::failure)?;

    if missing.is_empty() {
        println!(
            "Manifest OK: {} dataset(s), every listed file present.",
            manifest.total_datasets
        );
        return Ok(());
    }

    for path in &missing {
        println!("missing: {}", path.display());
    }
    Err(CliError::failure(anyhow!(
        "{} file(s) listed in {} are missing",
        missing.len(),
        args.manifest_file.display()
    )))
}
