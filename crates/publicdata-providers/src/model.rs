//! Shared provider data model: options going in, typed results coming out.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use publicdata_http::RetryPolicy;
use publicdata_resolve::Asset;

use crate::error::ProviderError;

/// Publication language served by provider endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English publications.
    #[default]
    En,
    /// French publications.
    Fr,
}

impl Language {
    /// Two-letter code used in provider URLs.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ProviderError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            _ => Err(ProviderError::UnsupportedLanguage {
                input: raw.to_string(),
            }),
        }
    }
}

/// Options controlling a dataset fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Keep only assets whose format or title contains this string,
    /// case-insensitively. Applies to landing-page providers.
    pub format_filter: Option<String>,
    /// Return without any network traffic when the primary file is already
    /// on disk.
    pub skip_existing: bool,
    /// Publication language for endpoints that serve more than one.
    pub language: Language,
    /// Retry schedule for every request the fetch performs.
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            format_filter: None,
            skip_existing: true,
            language: Language::En,
            retry: RetryPolicy::default(),
        }
    }
}

/// A dataset handle returned by provider searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    /// Provider-specific dataset identifier.
    pub id: String,
    /// Name of the provider that can fetch this dataset.
    pub provider: String,
    /// Human-readable dataset title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short description of the dataset contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Canonical page or endpoint for the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Outcome of a dataset fetch, tagged by provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum DatasetResult {
    /// A Statistics Canada table acquired through the WDS bulk endpoint.
    Statcan {
        /// Dataset identifier, `statcan_{pid}`.
        dataset_id: String,
        /// 8-digit product id of the table.
        pid: String,
        /// Table title, from the table manifest when one was present.
        title: String,
        /// WDS URL the table was (or would have been) fetched from.
        url: String,
        /// Paths written under the output directory, in archive order.
        files: Vec<PathBuf>,
        /// True when the table was already on disk and nothing was fetched.
        skipped: bool,
        /// Parsed table manifest, when the archive carried one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_manifest: Option<Value>,
    },
    /// One or more CMHC assets resolved from a landing page.
    Cmhc {
        /// Dataset identifier derived from the landing URL.
        dataset_id: String,
        /// Landing page the assets were resolved from.
        landing_url: String,
        /// Paths written under the output directory, in resolution order.
        files: Vec<PathBuf>,
        /// Every resolved asset, including ones that failed to download.
        assets: Vec<Asset>,
        /// One formatted message per asset that failed to download.
        errors: Vec<String>,
    },
}

impl DatasetResult {
    /// Identifier of the fetched dataset.
    #[must_use]
    pub fn dataset_id(&self) -> &str {
        match self {
            Self::Statcan { dataset_id, .. } | Self::Cmhc { dataset_id, .. } => dataset_id,
        }
    }

    /// Paths written under the output directory.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Statcan { files, .. } | Self::Cmhc { files, .. } => files,
        }
    }

    /// Machine-friendly provider discriminator.
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::Statcan { .. } => "statcan",
            Self::Cmhc { .. } => "cmhc",
        }
    }
}
