use crate::types::{ActivePluginSet, PluginId, UnusedPluginSet};

/// Installed plugins that are not in the active set.
pub fn unused<'a, I>(installed: I, active: &ActivePluginSet) -> UnusedPluginSet
where
    I: IntoIterator<Item = &'a PluginId>,
{
    installed
        .into_iter()
        .filter(|id| !active.contains(id.as_str()))
        .cloned()
        .collect()
}
