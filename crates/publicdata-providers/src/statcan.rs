//! Statistics Canada tables via the Web Data Service bulk endpoint.
//!
//! WDS serves a whole table as one ZIP containing the table CSV and usually
//! a `{pid}_MetaData.csv`. The adapter downloads the archive to a temporary
//! file, extracts it with entry-path sanitization, reads any table manifest,
//! and writes provenance sidecars for everything it extracted.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use publicdata_http::{DownloadOptions, HttpClient};
use publicdata_provenance::{HashAlgorithm, write_provenance};

use crate::error::{ProviderError, ProviderResult};
use crate::model::{DatasetRef, DatasetResult, FetchOptions, Language};
use crate::registry::Provider;

/// Production base URL of the WDS full-table CSV endpoint.
pub const WDS_BASE_URL: &str =
    "https://www150.statcan.gc.ca/t1/wds/rest/getFullTableDownloadCSV";

/// Reduce a table identifier to its 8-digit product id.
///
/// Accepts the dashed form (`18-10-0004`), the bare PID (`18100004`), and
/// longer identifiers whose first eight characters are the PID
/// (`1810000401`). Spaces and hyphens are ignored.
pub fn normalize_pid(input: &str) -> ProviderResult<String> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .collect();
    if cleaned.len() >= 8 && cleaned.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        return Ok(cleaned[..8].to_string());
    }
    Err(ProviderError::InvalidPid {
        input: input.to_string(),
    })
}

/// Render an 8-digit PID in the dashed `NN-NN-NNNN` form used on the
/// StatCan site. Anything else passes through unchanged.
#[must_use]
pub fn format_table_number(pid: &str) -> String {
    if pid.len() == 8 && pid.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &pid[..2], &pid[2..4], &pid[4..])
    } else {
        pid.to_string()
    }
}

/// Dataset provider for Statistics Canada tables.
#[derive(Debug, Clone)]
pub struct StatCanProvider {
    client: HttpClient,
    base_url: String,
}

impl StatCanProvider {
    /// Provider against the production WDS endpoint.
    pub fn new() -> ProviderResult<Self> {
        Self::with_base_url(WDS_BASE_URL)
    }

    /// Provider against a WDS-compatible endpoint at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> ProviderResult<Self> {
        let client = HttpClient::new().map_err(ProviderError::http)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Provider reusing an already-built `client`, e.g. one carrying a
    /// caller-chosen timeout.
    pub fn with_client(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn wds_url(&self, pid: &str, language: Language) -> String {
        format!("{}/{}/{pid}", self.base_url, language.code())
    }

    async fn acquire(
        &self,
        pid: &str,
        url: &str,
        output_dir: &Path,
        options: &FetchOptions,
    ) -> ProviderResult<DatasetResult> {
        let archive_path = output_dir.join(format!("{pid}_temp.zip"));
        let outcome = self
            .download_and_extract(pid, url, output_dir, &archive_path, options)
            .await;
        remove_temp_archive(&archive_path);
        outcome
    }

    async fn download_and_extract(
        &self,
        pid: &str,
        url: &str,
        output_dir: &Path,
        archive_path: &Path,
        options: &FetchOptions,
    ) -> ProviderResult<DatasetResult> {
        let download = DownloadOptions {
            retry: options.retry.clone(),
            ..DownloadOptions::default()
        };
        self.client
            .download(url, archive_path, &download)
            .await
            .map_err(ProviderError::http)?;

        let files = extract_archive(archive_path, output_dir)?;
        let table_manifest = parse_table_manifest(output_dir, pid, &files)?;
        write_sidecars(&files, output_dir, url, pid, table_manifest.as_ref());

        let title = table_manifest
            .as_ref()
            .and_then(|manifest| manifest.get("title"))
            .and_then(Value::as_str)
            .map_or_else(|| format!("StatsCan Table {pid}"), ToString::to_string);

        info!(pid, count = files.len(), "extracted table files");
        Ok(DatasetResult::Statcan {
            dataset_id: format!("statcan_{pid}"),
            pid: pid.to_string(),
            title,
            url: url.to_string(),
            files,
            skipped: false,
            table_manifest,
        })
    }
}

#[async_trait]
impl Provider for StatCanProvider {
    fn name(&self) -> &'static str {
        "statcan"
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<DatasetRef>> {
        debug!(query, "statcan search is not wired to a live index");
        Ok(Vec::new())
    }

    async fn fetch(
        &self,
        dataset_id: &str,
        output_dir: &Path,
        options: &FetchOptions,
    ) -> ProviderResult<DatasetResult> {
        let pid = normalize_pid(dataset_id)?;
        fs::create_dir_all(output_dir)
            .map_err(|source| ProviderError::io("statcan.create_output_dir", output_dir, source))?;

        let url = self.wds_url(&pid, options.language);
        let main_csv = output_dir.join(format!("{pid}.csv"));
        if options.skip_existing && main_csv.is_file() {
            info!(pid, path = %main_csv.display(), "table already on disk, skipping fetch");
            return Ok(DatasetResult::Statcan {
                dataset_id: format!("statcan_{pid}"),
                pid: pid.clone(),
                title: format!("StatsCan Table {pid}"),
                url,
                files: vec![PathBuf::from(format!("{pid}.csv"))],
                skipped: true,
                table_manifest: None,
            });
        }

        self.acquire(&pid, &url, output_dir, options)
            .await
            .map_err(|source| ProviderError::statcan(pid.as_str(), source))
    }
}

/// Extract every file entry of `source` into `target`, preserving the
/// archive's relative layout. Returns the extracted paths relative to
/// `target`, in archive order.
fn extract_archive(source: &Path, target: &Path) -> ProviderResult<Vec<PathBuf>> {
    let file = File::open(source)
        .map_err(|source_err| ProviderError::io("extract.open", source, source_err))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|source_err| ProviderError::zip("extract.decode", source, source_err))?;

    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source_err| ProviderError::zip("extract.read_entry", source, source_err))?;
        let entry_path = sanitize_entry_path(entry.name())?;

        // Directory entries carry no bytes; parents are created per file.
        if entry.name().ends_with('/') {
            continue;
        }

        let destination = target.join(&entry_path);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source_err| {
                ProviderError::io("extract.create_parent", parent, source_err)
            })?;
        }
        let mut output = File::create(&destination).map_err(|source_err| {
            ProviderError::io("extract.create_file", &destination, source_err)
        })?;
        io::copy(&mut entry, &mut output)
            .map_err(|source_err| ProviderError::io("extract.copy", &destination, source_err))?;
        extracted.push(entry_path);
    }

    Ok(extracted)
}

fn sanitize_entry_path(entry: &str) -> ProviderResult<PathBuf> {
    let path = Path::new(entry);
    if path.is_absolute() {
        return Err(ProviderError::UnsafeArchivePath {
            entry: entry.to_string(),
        });
    }

    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => sanitized.push(segment),
            Component::CurDir => {}
            _ => {
                return Err(ProviderError::UnsafeArchivePath {
                    entry: entry.to_string(),
                });
            }
        }
    }

    Ok(sanitized)
}

/// Look for a table manifest among the extracted files: `manifest.json`
/// parsed as JSON when valid, else a synthetic record pointing at
/// `{pid}_MetaData.csv` when WDS shipped one. Only files the archive itself
/// delivered count; a run manifest already sitting in the output directory
/// is not table metadata.
fn parse_table_manifest(
    output_dir: &Path,
    pid: &str,
    extracted: &[PathBuf],
) -> ProviderResult<Option<Value>> {
    let shipped = |name: &str| extracted.iter().any(|path| path == Path::new(name));

    if shipped("manifest.json") {
        let manifest_path = output_dir.join("manifest.json");
        let raw = fs::read_to_string(&manifest_path)
            .map_err(|source| ProviderError::io("statcan.read_table_manifest", &manifest_path, source))?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => return Ok(Some(value)),
            Err(error) => {
                warn!(path = %manifest_path.display(), %error, "table manifest is not valid json");
            }
        }
    }

    let metadata_name = format!("{pid}_MetaData.csv");
    if shipped(&metadata_name) {
        return Ok(Some(json!({
            "metadata_file": metadata_name,
            "title": format!("StatsCan Table {pid}"),
        })));
    }

    Ok(None)
}

/// Write a provenance sidecar for each extracted file. Sidecar problems are
/// logged and never fail the fetch.
fn write_sidecars(
    files: &[PathBuf],
    output_dir: &Path,
    url: &str,
    pid: &str,
    table_manifest: Option<&Value>,
) {
    let mut extra = Map::new();
    extra.insert("provider".to_string(), Value::from("statcan"));
    extra.insert("pid".to_string(), Value::from(pid));
    extra.insert(
        "table_number".to_string(),
        Value::from(format_table_number(pid)),
    );
    if let Some(title) = table_manifest.and_then(|manifest| manifest.get("title")) {
        extra.insert("title".to_string(), title.clone());
    }

    for relative in files {
        let data_path = output_dir.join(relative);
        if let Err(error) = write_provenance(
            &data_path,
            url,
            Some("application/zip"),
            &extra,
            HashAlgorithm::Sha256,
        ) {
            warn!(path = %data_path.display(), %error, "failed to write provenance sidecar");
        }
    }
}

fn remove_temp_archive(path: &Path) {
    if path.exists() {
        if let Err(error) = fs::remove_file(path) {
            warn!(path = %path.display(), %error, "failed to remove temp archive");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use publicdata_http::RetryPolicy;
    use publicdata_provenance::read_provenance;
    use std::io::{Cursor, Write};
    use std::time::Duration;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn quick_options() -> FetchOptions {
        FetchOptions {
            retry: RetryPolicy {
                max_retries: 1,
                initial_delay: Duration::from_millis(5),
            },
            ..FetchOptions::default()
        }
    }

    fn table_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).expect("start zip entry");
            writer
                .write_all(contents.as_bytes())
                .expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    #[test]
    fn normalize_pid_accepts_the_usual_spellings() {
        assert_eq!(normalize_pid("18100004").expect("bare"), "18100004");
        assert_eq!(normalize_pid("18-10-0004").expect("dashed"), "18100004");
        assert_eq!(normalize_pid(" 18 10 0004 ").expect("spaced"), "18100004");
        assert_eq!(normalize_pid("1810000401").expect("long"), "18100004");
    }

    #[test]
    fn normalize_pid_rejects_short_and_non_numeric_ids() {
        assert!(matches!(
            normalize_pid("1810"),
            Err(ProviderError::InvalidPid { .. })
        ));
        assert!(matches!(
            normalize_pid("table-one"),
            Err(ProviderError::InvalidPid { input }) if input == "table-one"
        ));
    }

    #[test]
    fn table_number_formats_eight_digit_pids_only() {
        assert_eq!(format_table_number("18100004"), "18-10-0004");
        assert_eq!(format_table_number("1810"), "1810");
        assert_eq!(format_table_number("table"), "table");
    }

    #[test]
    fn sanitize_rejects_escaping_entries() {
        assert!(sanitize_entry_path("18100004.csv").is_ok());
        assert_eq!(
            sanitize_entry_path("./docs/readme.txt").expect("nested"),
            PathBuf::from("docs/readme.txt")
        );
        assert!(matches!(
            sanitize_entry_path("/etc/passwd"),
            Err(ProviderError::UnsafeArchivePath { .. })
        ));
        assert!(matches!(
            sanitize_entry_path("../outside.csv"),
            Err(ProviderError::UnsafeArchivePath { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_downloads_extracts_and_writes_sidecars() {
        let body = table_archive(&[
            ("18100004.csv", "REF_DATE,GEO,VALUE\n2024-01,Canada,3.4\n"),
            ("18100004_MetaData.csv", "Cube Title,CPI monthly\n"),
        ]);
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(200)
                .header("content-type", "application/zip")
                .body(body.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let result = provider
            .fetch("18-10-0004", temp.path(), &quick_options())
            .await
            .expect("fetch table");

        mock.assert();
        match &result {
            DatasetResult::Statcan {
                dataset_id,
                pid,
                title,
                files,
                skipped,
                table_manifest,
                ..
            } => {
                assert_eq!(dataset_id, "statcan_18100004");
                assert_eq!(pid, "18100004");
                assert_eq!(title, "StatsCan Table 18100004");
                assert_eq!(
                    files,
                    &[
                        PathBuf::from("18100004.csv"),
                        PathBuf::from("18100004_MetaData.csv"),
                    ]
                );
                assert!(!skipped);
                let manifest = table_manifest.as_ref().expect("synthetic manifest");
                assert_eq!(manifest["metadata_file"], "18100004_MetaData.csv");
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        assert!(temp.path().join("18100004.csv").is_file());
        assert!(
            !temp.path().join("18100004_temp.zip").exists(),
            "temp archive should be removed"
        );

        let record =
            read_provenance(&temp.path().join("18100004.csv")).expect("sidecar for table csv");
        assert_eq!(record.extra["provider"], "statcan");
        assert_eq!(record.extra["pid"], "18100004");
        assert_eq!(record.extra["table_number"], "18-10-0004");
        assert_eq!(record.extra["title"], "StatsCan Table 18100004");
        assert_eq!(record.content_type.as_deref(), Some("application/zip"));
    }

    #[tokio::test]
    async fn shipped_manifest_enriches_the_table_title() {
        let body = table_archive(&[
            ("18100004.csv", "REF_DATE,VALUE\n2024-01,3.4\n"),
            (
                "manifest.json",
                r#"{"title": "Consumer Price Index, monthly"}"#,
            ),
        ]);
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(200).body(body.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let result = provider
            .fetch("18100004", temp.path(), &quick_options())
            .await
            .expect("fetch table");

        match result {
            DatasetResult::Statcan { title, table_manifest, .. } => {
                assert_eq!(title, "Consumer Price Index, monthly");
                assert_eq!(
                    table_manifest.expect("manifest")["title"],
                    "Consumer Price Index, monthly"
                );
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn a_leftover_run_manifest_is_not_table_metadata() {
        let body = table_archive(&[("18100004.csv", "REF_DATE,VALUE\n2024-01,3.4\n")]);
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(200).body(body.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        fs::write(
            temp.path().join("manifest.json"),
            r#"{"created_at": "2026-01-01T00:00:00Z", "datasets": []}"#,
        )
        .expect("seed run manifest");

        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let result = provider
            .fetch("18100004", temp.path(), &quick_options())
            .await
            .expect("fetch table");

        match result {
            DatasetResult::Statcan { table_manifest, .. } => {
                assert!(table_manifest.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn existing_table_short_circuits_without_network() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(200).body("unreachable");
        });

        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("18100004.csv"), "cached\n").expect("seed table");

        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let result = provider
            .fetch("18100004", temp.path(), &quick_options())
            .await
            .expect("skip fetch");

        mock.assert_hits(0);
        match result {
            DatasetResult::Statcan { files, skipped, .. } => {
                assert!(skipped);
                assert_eq!(files, [PathBuf::from("18100004.csv")]);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn skip_existing_off_refetches_an_existing_table() {
        let body = table_archive(&[("18100004.csv", "REF_DATE,VALUE\n2024-02,3.5\n")]);
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(200).body(body.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("18100004.csv"), "stale\n").expect("seed table");

        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let options = FetchOptions {
            skip_existing: false,
            ..quick_options()
        };
        provider
            .fetch("18100004", temp.path(), &options)
            .await
            .expect("refetch table");

        mock.assert();
        let refreshed =
            fs::read_to_string(temp.path().join("18100004.csv")).expect("read refreshed table");
        assert!(refreshed.contains("2024-02"));
    }

    #[tokio::test]
    async fn french_tables_use_the_fr_endpoint() {
        let body = table_archive(&[("18100004.csv", "PÉRIODE,VALEUR\n2024-01,3.4\n")]);
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/fr/18100004");
            then.status(200).body(body.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let options = FetchOptions {
            language: Language::Fr,
            ..quick_options()
        };
        provider
            .fetch("18100004", temp.path(), &options)
            .await
            .expect("fetch french table");

        mock.assert();
    }

    #[tokio::test]
    async fn corrupt_archive_fails_wrapped_and_cleaned_up() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(200).body("this is not a zip archive");
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let err = provider
            .fetch("18100004", temp.path(), &quick_options())
            .await
            .expect_err("corrupt archive should fail");

        match err {
            ProviderError::StatCanTable { pid, source } => {
                assert_eq!(pid, "18100004");
                assert!(matches!(*source, ProviderError::Zip { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(
            !temp.path().join("18100004_temp.zip").exists(),
            "temp archive should be removed on failure"
        );
    }

    #[tokio::test]
    async fn server_error_status_is_wrapped_with_the_pid() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(404);
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let err = provider
            .fetch("18100004", temp.path(), &quick_options())
            .await
            .expect_err("missing table should fail");

        match err {
            ProviderError::StatCanTable { pid, source } => {
                assert_eq!(pid, "18100004");
                assert!(matches!(*source, ProviderError::Http { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn escaping_archive_entries_abort_the_fetch() {
        let body = table_archive(&[("../escape.csv", "nope\n")]);
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/en/18100004");
            then.status(200).body(body.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = StatCanProvider::with_base_url(server.base_url()).expect("provider");
        let err = provider
            .fetch("18100004", temp.path(), &quick_options())
            .await
            .expect_err("escaping entry should fail");

        match err {
            ProviderError::StatCanTable { source, .. } => {
                assert!(matches!(*source, ProviderError::UnsafeArchivePath { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!temp.path().join("..").join("escape.csv").is_file());
    }

    #[tokio::test]
    async fn invalid_table_id_fails_before_any_request() {
        let temp = TempDir::new().expect("tempdir");
        let provider = StatCanProvider::new().expect("provider");
        let err = provider
            .fetch("not-a-table", temp.path(), &quick_options())
            .await
            .expect_err("invalid id should fail");
        assert!(matches!(err, ProviderError::InvalidPid { .. }));
    }

    #[tokio::test]
    async fn search_is_a_stub_that_returns_nothing() {
        let provider = StatCanProvider::new().expect("provider");
        let hits = provider.search("consumer price index").await.expect("search");
        assert!(hits.is_empty());
    }
}
