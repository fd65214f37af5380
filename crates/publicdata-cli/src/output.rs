//! Renderers for command output: one summary line on stdout, details
//! indented beneath it.

use publicdata_catalog::CatalogEntry;
use publicdata_providers::DatasetResult;

/// Print search hits as an aligned table, or a no-results line naming the
/// query.
pub(crate) fn render_search_results(query: &str, provider: Option<&str>, hits: &[CatalogEntry]) {
    if hits.is_empty() {
        match provider {
            Some(name) => println!("No datasets matching '{query}' from provider '{name}'."),
            None => println!("No datasets matching '{query}'."),
        }
        return;
    }

    println!("{:<28} {:<8} TITLE", "DATASET", "PROVIDER");
    for hit in hits {
        println!("{:<28} {:<8} {}", hit.dataset_id, hit.provider, hit.title);
    }
}

/// Print the outcome of a fetch: the summary line, the files written, and
/// any per-asset failures.
pub(crate) fn render_fetch_result(result: &DatasetResult) {
    println!("{}", summary_line(result));
    for file in result.files() {
        println!("  {}", file.display());
    }
    if let DatasetResult::Cmhc { errors, .. } = result {
        for error in errors {
            println!("  error: {error}");
        }
    }
}

/// One-line outcome summary for a fetch result.
fn summary_line(result: &DatasetResult) -> String {
    match result {
        DatasetResult::Statcan {
            dataset_id,
            title,
            files,
            skipped,
            ..
        } => {
            if *skipped {
                format!("{dataset_id}: {title} already on disk, skipped")
            } else {
                format!("{dataset_id}: fetched {title}, {} file(s)", files.len())
            }
        }
        DatasetResult::Cmhc {
            dataset_id,
            files,
            assets,
            errors,
            ..
        } => {
            if errors.is_empty() {
                format!(
                    "{dataset_id}: downloaded {} of {} asset(s)",
                    files.len(),
                    assets.len()
                )
            } else {
                format!(
                    "{dataset_id}: downloaded {} of {} asset(s), {} failed",
                    files.len(),
                    assets.len(),
                    errors.len()
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn statcan_result(skipped: bool) -> DatasetResult {
        DatasetResult::Statcan {
            dataset_id: "statcan_18100004".to_string(),
            pid: "18100004".to_string(),
            title: "StatsCan Table 18100004".to_string(),
            url: "https://www150.statcan.gc.ca/t1/wds/rest/getFullTableDownloadCSV/en/18100004"
                .to_string(),
            files: vec![PathBuf::from("18100004.csv")],
            skipped,
            table_manifest: None,
        }
    }

    fn cmhc_result(files: usize, errors: usize) -> DatasetResult {
        use publicdata_providers::Asset;

        let assets = (0..files + errors)
            .map(|n| Asset {
                url: format!("https://example.org/asset_{n}.xlsx"),
                title: format!("asset_{n}"),
                format: "xlsx".to_string(),
                rank: Some(u32::try_from(n + 1).expect("rank")),
                local_path: None,
                error: None,
            })
            .collect();
        DatasetResult::Cmhc {
            dataset_id: "cmhc_rental-market".to_string(),
            landing_url: "https://www.cmhc-schl.gc.ca/data/rental-market".to_string(),
            files: (0..files)
                .map(|n| PathBuf::from(format!("asset_{n}.xlsx")))
                .collect(),
            assets,
            errors: (0..errors)
                .map(|n| format!("Failed to download 'asset_{n}'"))
                .collect(),
        }
    }

    #[test]
    fn statcan_summaries_distinguish_skips_from_fetches() {
        assert_eq!(
            summary_line(&statcan_result(false)),
            "statcan_18100004: fetched StatsCan Table 18100004, 1 file(s)"
        );
        assert_eq!(
            summary_line(&statcan_result(true)),
            "statcan_18100004: StatsCan Table 18100004 already on disk, skipped"
        );
    }

    #[test]
    fn cmhc_summaries_count_failures_only_when_present() {
        assert_eq!(
            summary_line(&cmhc_result(2, 0)),
            "cmhc_rental-market: downloaded 2 of 2 asset(s)"
        );
        assert_eq!(
            summary_line(&cmhc_result(1, 1)),
            "cmhc_rental-market: downloaded 1 of 2 asset(s), 1 failed"
        );
    }
}
