use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Short name of a plugin, without any `@version` suffix. Case sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse the value of a `plugin="<id>@<version>"` attribute.
    ///
    /// Everything before the first `@` is the id; a value without `@` is
    /// kept verbatim. Returns `None` when the id part is empty.
    pub fn from_attribute(value: &str) -> Option<Self> {
        let id = value.split('@').next().unwrap_or_default();
        if id.is_empty() {
            None
        } else {
            Some(Self::new(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PluginId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PluginId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One line of the installed-plugins list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPluginEntry {
    pub id: PluginId,
    pub version: Option<String>,
}

impl InstalledPluginEntry {
    pub fn version_or_latest(&self) -> &str {
        self.version.as_deref().unwrap_or("latest")
    }
}

impl fmt::Display for InstalledPluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.version_or_latest())
    }
}

/// Metadata the plugin manager reports for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub id: PluginId,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub bundled: bool,
    /// Declared dependencies, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<PluginId>,
}

impl PluginMetadata {
    pub fn new(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            version: None,
            bundled: false,
            dependencies: Vec::new(),
        }
    }

    pub fn bundled(mut self) -> Self {
        self.bundled = true;
        self
    }

    pub fn with_dependencies<I, T>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<PluginId>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only view of plugin metadata keyed by id.
///
/// An id with no entry is legal and simply has no dependencies.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    plugins: HashMap<PluginId, PluginMetadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries with the same id replace earlier ones.
    pub fn from_plugins<I>(plugins: I) -> Self
    where
        I: IntoIterator<Item = PluginMetadata>,
    {
        let plugins = plugins
            .into_iter()
            .map(|plugin| (plugin.id.clone(), plugin))
            .collect();
        Self { plugins }
    }

    pub fn get(&self, id: &str) -> Option<&PluginMetadata> {
        self.plugins.get(id)
    }

    pub fn dependencies_of(&self, id: &str) -> &[PluginId] {
        self.plugins
            .get(id)
            .map(|plugin| plugin.dependencies.as_slice())
            .unwrap_or_default()
    }

    /// Ids flagged as bundled, sorted.
    pub fn bundled_ids(&self) -> Vec<&PluginId> {
        let mut ids: Vec<&PluginId> = self
            .plugins
            .values()
            .filter(|plugin| plugin.bundled)
            .map(|plugin| &plugin.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Why a plugin is considered active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageReason {
    /// Referenced by the configuration document at this (root-relative) path.
    DirectlyUsed(PathBuf),
    BundledCore,
    DependencyOf(PluginId),
}

impl UsageReason {
    pub fn is_seed(&self) -> bool {
        !matches!(self, UsageReason::DependencyOf(_))
    }
}

impl fmt::Display for UsageReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageReason::DirectlyUsed(path) => write!(f, "Directly used in '{}'", path.display()),
            UsageReason::BundledCore => f.write_str("Bundled core plugin"),
            UsageReason::DependencyOf(parent) => write!(f, "Dependency of '{}'", parent),
        }
    }
}

/// Insertion-ordered reasons; the order of seeds drives the closure.
pub type UsageReasons = IndexMap<PluginId, UsageReason>;

/// Every plugin considered in use, with the reason it first entered the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivePluginSet {
    reasons: UsageReasons,
}

impl ActivePluginSet {
    pub fn get(&self, id: &str) -> Option<&UsageReason> {
        self.reasons.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.reasons.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PluginId, &UsageReason)> {
        self.reasons.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PluginId> {
        self.reasons.keys()
    }

    /// Entries sorted by id, for presentation.
    pub fn sorted(&self) -> Vec<(&PluginId, &UsageReason)> {
        let mut entries: Vec<_> = self.reasons.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn into_reasons(self) -> UsageReasons {
        self.reasons
    }
}

impl From<UsageReasons> for ActivePluginSet {
    fn from(reasons: UsageReasons) -> Self {
        Self { reasons }
    }
}

/// Installed plugins that are not active, sorted.
pub type UnusedPluginSet = BTreeSet<PluginId>;
