use serde::{Deserialize, Serialize};

use prune_core::error::Result;
use prune_plugin::{MetadataStore, PluginId, PluginMetadata};

/// Body of `GET /pluginManager/api/json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManagerResponse {
    pub plugins: Vec<ApiPlugin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlugin {
    pub short_name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub bundled: bool,
    #[serde(default)]
    pub dependencies: Vec<ApiDependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDependency {
    pub short_name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl PluginManagerResponse {
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn into_store(self) -> MetadataStore {
        MetadataStore::from_plugins(self.plugins.into_iter().map(PluginMetadata::from))
    }
}

impl From<ApiPlugin> for PluginMetadata {
    fn from(plugin: ApiPlugin) -> Self {
        // Optional dependencies are followed like required ones.
        PluginMetadata {
            id: PluginId::new(plugin.short_name),
            version: plugin.version,
            bundled: plugin.bundled,
            dependencies: plugin
                .dependencies
                .into_iter()
                .map(|dep| PluginId::new(dep.short_name))
                .collect(),
        }
    }
}
