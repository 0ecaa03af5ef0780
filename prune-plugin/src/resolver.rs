//! Transitive closure of active plugins over declared dependencies.

use std::collections::VecDeque;
use tracing::{debug, instrument};

use crate::types::{ActivePluginSet, MetadataStore, UsageReason, UsageReasons};

/// Expand `seeds` breadth-first through `metadata` dependencies.
///
/// Seeds are visited in their insertion order. A plugin keeps the reason it
/// was first inserted with, and an inserted plugin is never enqueued again,
/// so cycles terminate after at most `seeds + metadata` visits. Plugins
/// without metadata stay in the result but are not expanded.
#[instrument(skip_all, fields(seeds = seeds.len(), metadata = metadata.len()))]
pub fn resolve(seeds: &UsageReasons, metadata: &MetadataStore) -> ActivePluginSet {
    let mut resolved: UsageReasons = seeds.clone();
    let mut queue: VecDeque<_> = seeds.keys().cloned().collect();

    while let Some(current) = queue.pop_front() {
        for dependency in metadata.dependencies_of(current.as_str()) {
            if resolved.contains_key(dependency) {
                continue;
            }
            resolved.insert(
                dependency.clone(),
                UsageReason::DependencyOf(current.clone()),
            );
            queue.push_back(dependency.clone());
        }
    }

    debug!(
        seeds = seeds.len(),
        active = resolved.len(),
        "resolved plugin dependencies"
    );
    ActivePluginSet::from(resolved)
}
