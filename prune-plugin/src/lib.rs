//! Plugin usage analysis for a Jenkins controller.
//!
//! Scans configuration documents for plugin references, expands them
//! through the dependency graph and diffs the result against the
//! installed plugin list.

pub mod diff;
pub mod installed;
pub mod resolver;
pub mod scanner;
pub mod seeds;
pub mod types;

pub use diff::unused;
pub use installed::InstalledPlugins;
pub use resolver::resolve;
pub use scanner::{ConfigScanner, ScanOptions, ScannedDocument};
pub use seeds::{add_bundled_seeds, build_seeds, direct_usage_seeds};
pub use types::{
    ActivePluginSet, InstalledPluginEntry, MetadataStore, PluginId, PluginMetadata, UnusedPluginSet,
    UsageReason, UsageReasons,
};
