//! CMHC assets resolved from landing pages at fetch time.
//!
//! CMHC hosts its data files behind landing pages whose direct URLs rot, so
//! every fetch re-resolves the page. Each resolved asset downloads under a
//! name derived from its title; a failing asset is recorded on the result
//! and never sinks the rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use publicdata_http::{DownloadOptions, HttpClient, HttpError};
use publicdata_provenance::{HashAlgorithm, write_provenance};
use publicdata_resolve::{Asset, resolve_assets};

use crate::error::{ProviderError, ProviderResult};
use crate::model::{DatasetRef, DatasetResult, FetchOptions};
use crate::registry::Provider;

/// Dataset provider for CMHC landing pages.
#[derive(Debug, Clone)]
pub struct CmhcProvider {
    client: HttpClient,
}

impl CmhcProvider {
    /// Provider with a default client.
    pub fn new() -> ProviderResult<Self> {
        let client = HttpClient::new().map_err(ProviderError::http)?;
        Ok(Self::with_client(client))
    }

    /// Provider reusing an already-built `client`.
    #[must_use]
    pub const fn with_client(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetch the landing page and resolve its downloadable assets.
    pub async fn resolve(&self, landing_url: &str, options: &FetchOptions) -> ProviderResult<Vec<Asset>> {
        let html = self
            .client
            .fetch_text(landing_url, &options.retry)
            .await
            .map_err(ProviderError::http)?;
        let assets = resolve_assets(&html, landing_url).map_err(ProviderError::resolve)?;
        debug!(landing_url, count = assets.len(), "resolved landing page assets");
        Ok(assets)
    }
}

#[async_trait]
impl Provider for CmhcProvider {
    fn name(&self) -> &'static str {
        "cmhc"
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<DatasetRef>> {
        debug!(query, "cmhc search is not wired to a live index");
        Ok(Vec::new())
    }

    async fn fetch(
        &self,
        dataset_id: &str,
        output_dir: &Path,
        options: &FetchOptions,
    ) -> ProviderResult<DatasetResult> {
        let landing_url = dataset_id;
        fs::create_dir_all(output_dir)
            .map_err(|source| ProviderError::io("cmhc.create_output_dir", output_dir, source))?;

        let mut assets = self.resolve(landing_url, options).await?;
        if assets.is_empty() {
            return Err(ProviderError::NoAssets {
                landing_url: landing_url.to_string(),
                filter: None,
            });
        }

        if let Some(filter) = options.format_filter.as_deref() {
            let needle = filter.to_lowercase();
            assets.retain(|asset| {
                asset.format.to_lowercase().contains(&needle)
                    || asset.title.to_lowercase().contains(&needle)
            });
            if assets.is_empty() {
                return Err(ProviderError::NoAssets {
                    landing_url: landing_url.to_string(),
                    filter: Some(filter.to_string()),
                });
            }
        }

        let download = DownloadOptions {
            retry: options.retry.clone(),
            ..DownloadOptions::validated()
        };

        let mut files = Vec::new();
        let mut errors = Vec::new();
        for asset in &mut assets {
            let file_name = format!(
                "{}.{}",
                sanitize_title(&asset.title),
                sanitize_format(&asset.format)
            );
            let destination = output_dir.join(&file_name);

            match self.client.download(&asset.url, &destination, &download).await {
                Ok(written) => {
                    files.push(PathBuf::from(&file_name));
                    asset.local_path = Some(written);
                    write_asset_sidecar(&destination, asset, landing_url);
                }
                Err(cause) => {
                    let message = format!(
                        "Failed to download '{}' from {}: {cause}",
                        asset.title, asset.url
                    );
                    if matches!(cause, HttpError::ContentType { .. }) {
                        error!(url = asset.url.as_str(), %cause, "asset served html instead of data");
                    } else {
                        warn!(url = asset.url.as_str(), %cause, "asset download failed");
                    }
                    errors.push(message);
                    asset.error = Some(cause.to_string());
                }
            }
        }

        info!(
            landing_url,
            downloaded = files.len(),
            failed = errors.len(),
            "cmhc fetch finished"
        );
        Ok(DatasetResult::Cmhc {
            dataset_id: dataset_id_for(landing_url),
            landing_url: landing_url.to_string(),
            files,
            assets,
            errors,
        })
    }
}

/// Dataset identifier derived from the last non-empty path segment of the
/// landing URL.
fn dataset_id_for(landing_url: &str) -> String {
    let trimmed = landing_url.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or_default();
    format!("cmhc_{segment}")
}

/// Reduce an asset title to a safe file stem: keep alphanumerics, spaces,
/// hyphens, and underscores, then turn spaces into underscores.
fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe = kept.trim().replace(' ', "_");
    if safe.is_empty() {
        "asset".to_string()
    } else {
        safe
    }
}

/// Reduce an asset format to a safe extension: alphanumerics only.
fn sanitize_format(format: &str) -> String {
    let safe: String = format.chars().filter(|c| c.is_alphanumeric()).collect();
    if safe.is_empty() {
        "dat".to_string()
    } else {
        safe
    }
}

/// Write the sidecar for a downloaded asset. Sidecar problems are logged
/// and never fail the fetch.
fn write_asset_sidecar(data_path: &Path, asset: &Asset, landing_url: &str) {
    let mut extra = Map::new();
    extra.insert("provider".to_string(), Value::from("cmhc"));
    extra.insert("landing_page_url".to_string(), Value::from(landing_url));
    extra.insert("asset_title".to_string(), Value::from(asset.title.as_str()));
    extra.insert(
        "asset_format".to_string(),
        Value::from(asset.format.as_str()),
    );
    if let Some(rank) = asset.rank {
        extra.insert("asset_rank".to_string(), Value::from(rank));
    }

    if let Err(cause) = write_provenance(data_path, &asset.url, None, &extra, HashAlgorithm::Sha256)
    {
        warn!(path = %data_path.display(), %cause, "failed to write provenance sidecar");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use publicdata_http::RetryPolicy;
    use publicdata_provenance::read_provenance;
    use std::time::Duration;
    use tempfile::TempDir;

    fn quick_options() -> FetchOptions {
        FetchOptions {
            retry: RetryPolicy {
                max_retries: 1,
                initial_delay: Duration::from_millis(5),
            },
            ..FetchOptions::default()
        }
    }

    fn landing_page(server: &MockServer) -> String {
        format!(
            concat!(
                "<html><head><title>Rental Market Survey</title></head><body>",
                r#"<a href="{base}/files/rental-market-report.xlsx">Rental Market Report</a>"#,
                r#"<a href="/files/historical-rents.csv">Historical Average Rents</a>"#,
                r#"<a href="{base}/about">About this survey</a>"#,
                "</body></html>"
            ),
            base = server.base_url()
        )
    }

    #[test]
    fn titles_reduce_to_safe_file_stems() {
        assert_eq!(
            sanitize_title("Rental Market Report: Canada"),
            "Rental_Market_Report_Canada"
        );
        assert_eq!(sanitize_title("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_title("  spaced  out  "), "spaced__out");
        assert_eq!(sanitize_title("<<>>"), "asset");
        assert_eq!(sanitize_title("Données été"), "Données_été");
    }

    #[test]
    fn formats_reduce_to_safe_extensions() {
        assert_eq!(sanitize_format("xlsx"), "xlsx");
        assert_eq!(sanitize_format("c/s.v"), "csv");
        assert_eq!(sanitize_format("??"), "dat");
    }

    #[test]
    fn dataset_id_takes_the_last_nonempty_segment() {
        assert_eq!(
            dataset_id_for("https://www.cmhc-schl.gc.ca/data/rental-market"),
            "cmhc_rental-market"
        );
        assert_eq!(
            dataset_id_for("https://www.cmhc-schl.gc.ca/data/rental-market/"),
            "cmhc_rental-market"
        );
    }

    #[tokio::test]
    async fn fetch_downloads_every_resolved_asset() {
        let server = MockServer::start_async().await;
        let page = landing_page(&server);
        server.mock(|when, then| {
            when.method(GET).path("/data/rental-market");
            then.status(200)
                .header("content-type", "text/html")
                .body(page.clone());
        });
        server.mock(|when, then| {
            when.method(GET).path("/files/rental-market-report.xlsx");
            then.status(200)
                .header("content-type", "application/vnd.ms-excel")
                .body("workbook-bytes");
        });
        server.mock(|when, then| {
            when.method(GET).path("/files/historical-rents.csv");
            then.status(200)
                .header("content-type", "text/csv")
                .body("year,rent\n2024,1870\n");
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = CmhcProvider::new().expect("provider");
        let landing = server.url("/data/rental-market");
        let result = provider
            .fetch(&landing, temp.path(), &quick_options())
            .await
            .expect("fetch assets");

        match &result {
            DatasetResult::Cmhc {
                dataset_id,
                landing_url,
                files,
                assets,
                errors,
            } => {
                assert_eq!(dataset_id, "cmhc_rental-market");
                assert_eq!(landing_url, &landing);
                assert_eq!(
                    files,
                    &[
                        PathBuf::from("Rental_Market_Report.xlsx"),
                        PathBuf::from("Historical_Average_Rents.csv"),
                    ]
                );
                assert_eq!(assets.len(), 2);
                assert!(errors.is_empty());
                assert!(assets.iter().all(|asset| asset.local_path.is_some()));
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        let report = temp.path().join("Rental_Market_Report.xlsx");
        assert!(report.is_file());
        let record = read_provenance(&report).expect("sidecar for report");
        assert_eq!(record.extra["provider"], "cmhc");
        assert_eq!(record.extra["landing_page_url"], landing.as_str());
        assert_eq!(record.extra["asset_title"], "Rental Market Report");
        assert_eq!(record.extra["asset_format"], "xlsx");
        assert_eq!(record.extra["asset_rank"], 1);
    }

    #[tokio::test]
    async fn format_filter_keeps_matching_assets_only() {
        let server = MockServer::start_async().await;
        let page = landing_page(&server);
        server.mock(|when, then| {
            when.method(GET).path("/data/rental-market");
            then.status(200).body(page.clone());
        });
        let xlsx_mock = server.mock(|when, then| {
            when.method(GET).path("/files/rental-market-report.xlsx");
            then.status(200).body("workbook-bytes");
        });
        let csv_mock = server.mock(|when, then| {
            when.method(GET).path("/files/historical-rents.csv");
            then.status(200).body("year,rent\n");
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = CmhcProvider::new().expect("provider");
        let options = FetchOptions {
            format_filter: Some("xlsx".to_string()),
            ..quick_options()
        };
        let result = provider
            .fetch(&server.url("/data/rental-market"), temp.path(), &options)
            .await
            .expect("fetch filtered assets");

        xlsx_mock.assert();
        csv_mock.assert_hits(0);
        assert_eq!(result.files(), [PathBuf::from("Rental_Market_Report.xlsx")]);
    }

    #[tokio::test]
    async fn one_failing_asset_does_not_sink_the_batch() {
        let server = MockServer::start_async().await;
        let page = landing_page(&server);
        server.mock(|when, then| {
            when.method(GET).path("/data/rental-market");
            then.status(200).body(page.clone());
        });
        server.mock(|when, then| {
            when.method(GET).path("/files/rental-market-report.xlsx");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html>session expired</html>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/files/historical-rents.csv");
            then.status(200).body("year,rent\n2024,1870\n");
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = CmhcProvider::new().expect("provider");
        let result = provider
            .fetch(&server.url("/data/rental-market"), temp.path(), &quick_options())
            .await
            .expect("partial success is success");

        match &result {
            DatasetResult::Cmhc {
                files,
                assets,
                errors,
                ..
            } => {
                assert_eq!(files, &[PathBuf::from("Historical_Average_Rents.csv")]);
                assert_eq!(errors.len(), 1);
                assert!(errors[0].starts_with("Failed to download 'Rental Market Report'"));
                let failed = &assets[0];
                assert!(failed.error.is_some());
                assert!(failed.local_path.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn a_page_without_assets_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/data/empty");
            then.status(200)
                .body("<html><body><p>Nothing to download here.</p></body></html>");
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = CmhcProvider::new().expect("provider");
        let err = provider
            .fetch(&server.url("/data/empty"), temp.path(), &quick_options())
            .await
            .expect_err("no assets should fail");

        assert!(matches!(
            err,
            ProviderError::NoAssets { filter: None, .. }
        ));
    }

    #[tokio::test]
    async fn a_filter_matching_nothing_is_an_error_naming_the_filter() {
        let server = MockServer::start_async().await;
        let page = landing_page(&server);
        server.mock(|when, then| {
            when.method(GET).path("/data/rental-market");
            then.status(200).body(page.clone());
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = CmhcProvider::new().expect("provider");
        let options = FetchOptions {
            format_filter: Some("parquet".to_string()),
            ..quick_options()
        };
        let err = provider
            .fetch(&server.url("/data/rental-market"), temp.path(), &options)
            .await
            .expect_err("unmatched filter should fail");

        assert!(matches!(
            err,
            ProviderError::NoAssets { filter: Some(filter), .. } if filter == "parquet"
        ));
    }

    #[tokio::test]
    async fn an_unreachable_landing_page_fails_the_fetch() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/data/gone");
            then.status(404);
        });

        let temp = TempDir::new().expect("tempdir");
        let provider = CmhcProvider::new().expect("provider");
        let err = provider
            .fetch(&server.url("/data/gone"), temp.path(), &quick_options())
            .await
            .expect_err("missing landing page should fail");

        assert!(matches!(err, ProviderError::Http { .. }));
    }
}
