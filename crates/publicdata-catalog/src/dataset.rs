//! Curated dataset descriptors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CatalogResult;
use crate::layout::DataLayout;

/// A curated dataset: where it lives, how it is delivered, and how much of
/// the pipeline is automated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dataset {
    /// Stable dataset key, e.g. `cpi_all_items`.
    pub dataset: String,
    /// Provider responsible for the dataset (`statcan` or `cmhc`).
    pub provider: String,
    /// Human-readable metric description.
    pub metric: String,
    /// Statistics Canada product identifier, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    /// Publication cadence.
    pub frequency: String,
    /// Geographic coverage.
    pub geo_scope: String,
    /// Delivery mechanism used to fetch the dataset.
    pub delivery: String,
    /// Destination file relative to the raw-data root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_file: Option<PathBuf>,
    /// How automated the refresh is.
    pub automation_status: String,
    /// Operator note about refresh caveats.
    pub status_note: String,
    /// Landing page to resolve, for page-delivered datasets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// Direct download URL, when one is pinned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_url: Option<String>,
}

impl Dataset {
    /// Dashed table number derived from an 8-digit PID
    /// (`18100004` becomes `18-10-0004`); other PIDs pass through unchanged.
    #[must_use]
    pub fn table_number(&self) -> Option<String> {
        self.pid.as_ref().map(|pid| {
            if pid.len() == 8 {
                format!("{}-{}-{}", &pid[..2], &pid[2..4], &pid[4..])
            } else {
                pid.clone()
            }
        })
    }

    /// Resolve the target file under `layout`'s raw root, creating parent
    /// directories. Datasets without a target file yield `None`.
    pub fn destination(&self, layout: &DataLayout) -> CatalogResult<Option<PathBuf>> {
        match &self.target_file {
            None => Ok(None),
            Some(target) => layout.ensure_raw_destination(target).map(Some),
        }
    }
}

/// The curated dataset table this toolkit ships with.
#[must_use]
pub fn default_datasets() -> Vec<Dataset> {
    vec![
        Dataset {
            dataset: "cpi_all_items".to_string(),
            provider: "statcan".to_string(),
            metric: "Consumer Price Index, all-items (NSA)".to_string(),
            pid: Some("18100004".to_string()),
            frequency: "Monthly".to_string(),
            geo_scope: "Canada + provinces (CMA deflators derived downstream)".to_string(),
            delivery: "statcan_table".to_string(),
            target_file: Some(PathBuf::from("cpi_all_items_18100004.csv")),
            automation_status: "automatic".to_string(),
            status_note: "Verify the latest CPI release (usually mid-month) before re-running."
                .to_string(),
            page_url: None,
            direct_url: None,
        },
        Dataset {
            dataset: "median_household_income".to_string(),
            provider: "statcan".to_string(),
            metric: "Median after-tax income by economic family type (CIS)".to_string(),
            pid: Some("11100035".to_string()),
            frequency: "Annual".to_string(),
            geo_scope: "Canada, provinces, and major CMAs".to_string(),
            delivery: "statcan_table".to_string(),
            target_file: Some(PathBuf::from("median_household_income_11100035.csv")),
            automation_status: "automatic".to_string(),
            status_note: "CIS table provides CMA-level coverage for major metros; confirm vector \
                          availability for smaller metros before modeling."
                .to_string(),
            page_url: None,
            direct_url: None,
        },
        Dataset {
            dataset: "population_estimates".to_string(),
            provider: "statcan".to_string(),
            metric: "Population estimates, July 1 (CMA/CA, 2021 boundaries)".to_string(),
            pid: Some("17100148".to_string()),
            frequency: "Annual".to_string(),
            geo_scope: "Census metropolitan areas and agglomerations".to_string(),
            delivery: "statcan_table".to_string(),
            target_file: Some(PathBuf::from("population_estimates_17100148.csv")),
            automation_status: "automatic".to_string(),
            status_note: "Release every February; used to scale metrics per 100k residents."
                .to_string(),
            page_url: None,
            direct_url: None,
        },
        Dataset {
            dataset: "unemployment_rate".to_string(),
            provider: "statcan".to_string(),
            metric: "Labour force characteristics by CMA (3-month moving avg, SA)".to_string(),
            pid: Some("14100459".to_string()),
            frequency: "Monthly".to_string(),
            geo_scope: "Census metropolitan areas".to_string(),
            delivery: "statcan_table".to_string(),
            target_file: Some(PathBuf::from("unemployment_rate_14100459.csv")),
            automation_status: "automatic".to_string(),
            status_note: "Seasonally adjusted 3-month moving average preferred for stability."
                .to_string(),
            page_url: None,
            direct_url: None,
        },
        Dataset {
            dataset: "rental_market_rents".to_string(),
            provider: "cmhc".to_string(),
            metric: "Rental Market Report data tables".to_string(),
            pid: None,
            frequency: "Annual".to_string(),
            geo_scope: "Canada + major CMAs".to_string(),
            delivery: "cmhc_asset".to_string(),
            target_file: Some(PathBuf::from("rental_market_report_latest.xlsx")),
            automation_status: "semi-automatic".to_string(),
            status_note: "Uses the last verified CMHC blob URL; update when the 2026 release \
                          ships."
                .to_string(),
            page_url: Some(
                "https://www.cmhc-schl.gc.ca/professionals/housing-markets-data-and-research/housing-data/rental-market/rental-market-report-data-tables"
                    .to_string(),
            ),
            direct_url: None,
        },
        Dataset {
            dataset: "housing_starts".to_string(),
            provider: "cmhc".to_string(),
            metric: "Monthly housing starts + under construction".to_string(),
            pid: None,
            frequency: "Monthly".to_string(),
            geo_scope: "Canada + CMAs".to_string(),
            delivery: "cmhc_asset".to_string(),
            target_file: Some(PathBuf::from("housing_starts_latest.xlsx")),
            automation_status: "semi-automatic".to_string(),
            status_note: "Pinned to the November 2025 housing starts release; refresh when the \
                          next workbook is published."
                .to_string(),
            page_url: Some(
                "https://www.cmhc-schl.gc.ca/professionals/housing-markets-data-and-research/housing-data/data-tables/housing-market-data/monthly-housing-starts-construction-data-tables"
                    .to_string(),
            ),
            direct_url: None,
        },
    ]
}
