//! The `Provider` seam and the name-keyed registry behind the CLI.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use publicdata_http::HttpClient;

use crate::cmhc::CmhcProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::model::{DatasetRef, DatasetResult, FetchOptions};
use crate::statcan::{StatCanProvider, WDS_BASE_URL};

/// A source of Canadian public datasets.
///
/// `dataset_id` is provider-specific: a table identifier for StatCan, a
/// landing page URL for CMHC.
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Registry name of this provider.
    fn name(&self) -> &'static str;

    /// Search the provider for datasets matching `query`.
    async fn search(&self, query: &str) -> ProviderResult<Vec<DatasetRef>>;

    /// Fetch a dataset into `output_dir`.
    async fn fetch(
        &self,
        dataset_id: &str,
        output_dir: &Path,
        options: &FetchOptions,
    ) -> ProviderResult<DatasetResult>;
}

/// Providers keyed by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn Provider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// A registry with the stock providers registered.
    pub fn with_defaults() -> ProviderResult<Self> {
        let client = HttpClient::new().map_err(ProviderError::http)?;
        Ok(Self::with_client(&client))
    }

    /// A registry with the stock providers sharing `client`. The client is
    /// cheap to clone, so callers build one with their timeout and hand it
    /// to every provider.
    #[must_use]
    pub fn with_client(client: &HttpClient) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(StatCanProvider::with_client(
            client.clone(),
            WDS_BASE_URL,
        )));
        registry.register(Box::new(CmhcProvider::with_client(client.clone())));
        registry
    }

    /// Register `provider` under its own name, replacing any previous
    /// provider with that name.
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> ProviderResult<&dyn Provider> {
        self.providers
            .get(name)
            .map(|provider| provider.as_ref())
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_serves_both_providers() {
        let registry = ProviderRegistry::with_defaults().expect("registry");
        assert_eq!(registry.names(), ["cmhc", "statcan"]);
        assert_eq!(registry.get("statcan").expect("statcan").name(), "statcan");
        assert_eq!(registry.get("cmhc").expect("cmhc").name(), "cmhc");
    }

    #[test]
    fn unknown_provider_lookup_names_the_offender() {
        let registry = ProviderRegistry::with_defaults().expect("registry");
        let err = registry.get("opendata").expect_err("unknown provider");
        assert!(matches!(
            err,
            ProviderError::UnknownProvider { name } if name == "opendata"
        ));
    }

    #[test]
    fn a_shared_client_builds_the_same_lineup() {
        let client = HttpClient::new().expect("client");
        let registry = ProviderRegistry::with_client(&client);
        assert_eq!(registry.names(), ["cmhc", "statcan"]);
    }

    #[test]
    fn registering_the_same_name_replaces_the_provider() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(StatCanProvider::new().expect("provider")));
        registry.register(Box::new(StatCanProvider::new().expect("provider")));
        assert_eq!(registry.len(), 1);
    }
}
