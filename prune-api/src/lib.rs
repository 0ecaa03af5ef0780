//! Plugin metadata supply for the usage analysis.
//!
//! Metadata comes from the controller's plugin manager API, optionally
//! through an on-disk cache. Whatever happens here, the analysis gets a
//! finished [`MetadataStore`], empty when nothing could be loaded.

pub mod cache;
pub mod client;
pub mod models;
pub mod source;

pub use cache::MetadataCache;
pub use client::{ApiOptions, Credentials, JenkinsClient};
pub use models::{ApiDependency, ApiPlugin, PluginManagerResponse};
pub use source::{load_or_empty, ApiMetadataSource, MetadataSource, StaticMetadataSource};

pub use prune_plugin::MetadataStore;
