use tracing::{info, warn};

use prune_core::error::{PruneError, Result};
use prune_plugin::MetadataStore;

use crate::cache::MetadataCache;
use crate::client::JenkinsClient;
use crate::models::PluginManagerResponse;

/// Anything that can hand the analysis a finished metadata mapping.
pub trait MetadataSource {
    fn load(&self) -> Result<MetadataStore>;
}

/// Load metadata, degrading to an empty mapping on any failure.
pub fn load_or_empty(source: &dyn MetadataSource) -> MetadataStore {
    match source.load() {
        Ok(store) => store,
        Err(e) => {
            warn!("{e}");
            warn!("Continuing without plugin metadata; dependency resolution will be skipped");
            MetadataStore::new()
        }
    }
}

/// A fixed mapping, used when no API credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataSource {
    store: MetadataStore,
}

impl StaticMetadataSource {
    pub fn new(store: MetadataStore) -> Self {
        Self { store }
    }
}

impl MetadataSource for StaticMetadataSource {
    fn load(&self) -> Result<MetadataStore> {
        Ok(self.store.clone())
    }
}

/// Plugin manager API, consulted through an optional cache.
pub struct ApiMetadataSource {
    client: JenkinsClient,
    cache: Option<MetadataCache>,
}

impl ApiMetadataSource {
    pub fn new(client: JenkinsClient, cache: Option<MetadataCache>) -> Self {
        Self { client, cache }
    }

    fn from_cache(&self) -> Option<MetadataStore> {
        let body = self.cache.as_ref()?.load_fresh()?;
        match PluginManagerResponse::parse(&body) {
            Ok(response) => Some(response.into_store()),
            Err(e) => {
                warn!(error = %e, "Cache corrupted, fetching fresh data");
                None
            }
        }
    }
}

impl MetadataSource for ApiMetadataSource {
    fn load(&self) -> Result<MetadataStore> {
        if let Some(store) = self.from_cache() {
            return Ok(store);
        }

        let body = self
            .client
            .fetch_plugin_manager()
            .map_err(|e| PruneError::Metadata(format!("{e:#}")))?;
        let response = PluginManagerResponse::parse(&body)
            .map_err(|e| PruneError::Metadata(format!("unexpected API response: {e}")))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&body) {
                warn!(error = %e, "Cannot write plugin metadata cache");
            }
        }

        let store = response.into_store();
        info!(plugins = store.len(), "Loaded plugin metadata from API");
        Ok(store)
    }
}
