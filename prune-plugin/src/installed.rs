//! The installed-plugins list (`plugins.txt`): one `id[:version]` per line.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use prune_core::error::{PruneError, Result};
use tracing::debug;

use crate::types::{InstalledPluginEntry, PluginId};

#[derive(Debug, Clone, Default)]
pub struct InstalledPlugins {
    entries: Vec<InstalledPluginEntry>,
    by_id: HashMap<PluginId, usize>,
}

impl InstalledPlugins {
    /// Read the list from disk. A missing or unreadable file is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| PruneError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        let installed = Self::parse(&content);
        debug!(path = %path.display(), count = installed.len(), "loaded installed plugins");
        Ok(installed)
    }

    /// Blank lines and `#` comments are skipped. When an id repeats, the
    /// last line decides its version.
    pub fn parse(content: &str) -> Self {
        let mut installed = Self::default();

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(entry) = parse_line(line) {
                installed.push(entry);
            }
        }

        installed
    }

    fn push(&mut self, entry: InstalledPluginEntry) {
        match self.by_id.get(&entry.id) {
            Some(&index) => self.entries[index] = entry,
            None => {
                self.by_id.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&InstalledPluginEntry> {
        self.by_id.get(id).map(|&index| &self.entries[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// The `id:version` line to keep for a plugin; `id:latest` when the
    /// plugin is not installed or has no pinned version.
    pub fn pinned_line(&self, id: &PluginId) -> String {
        match self.get(id.as_str()) {
            Some(entry) => entry.to_string(),
            None => format!("{id}:latest"),
        }
    }

    pub fn ids(&self) -> BTreeSet<PluginId> {
        self.entries.iter().map(|entry| entry.id.clone()).collect()
    }

    pub fn entries(&self) -> &[InstalledPluginEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> Option<InstalledPluginEntry> {
    let (id, version) = match line.split_once(':') {
        Some((id, version)) => (id.trim(), Some(version.trim())),
        None => (line, None),
    };

    if id.is_empty() {
        return None;
    }

    Some(InstalledPluginEntry {
        id: PluginId::new(id),
        version: version.filter(|v| !v.is_empty()).map(str::to_string),
    })
}
