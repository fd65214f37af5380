//! In-memory dataset register with substring search.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, default_datasets};

/// A registered dataset as surfaced by search and listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Stable dataset identifier.
    pub dataset_id: String,
    /// Provider responsible for the dataset.
    pub provider: String,
    /// Human-readable title.
    pub title: String,
    /// Longer description used for search.
    pub description: String,
}

impl From<&Dataset> for CatalogEntry {
    fn from(dataset: &Dataset) -> Self {
        Self {
            dataset_id: dataset.dataset.clone(),
            provider: dataset.provider.clone(),
            title: dataset.metric.clone(),
            description: dataset.status_note.clone(),
        }
    }
}

/// Insertion-ordered register of datasets.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Catalog pre-populated with the curated dataset table.
    #[must_use]
    pub fn with_default_datasets() -> Self {
        let mut catalog = Self::new();
        for dataset in default_datasets() {
            catalog.register(CatalogEntry::from(&dataset));
        }
        catalog
    }

    /// Register `entry`, replacing any existing entry with the same id.
    pub fn register(&mut self, entry: CatalogEntry) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|candidate| candidate.dataset_id == entry.dataset_id)
        {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// List entries, optionally restricted to one provider.
    #[must_use]
    pub fn list(&self, provider: Option<&str>) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| provider.is_none_or(|name| entry.provider == name))
            .collect()
    }

    /// Case-insensitive substring search over titles and descriptions.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                entry.title.to_lowercase().contains(&needle)
                    || entry.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
