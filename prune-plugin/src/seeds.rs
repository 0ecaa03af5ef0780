//! Seed construction: direct references first, then bundled plugins.
//!
//! When a plugin is referenced by several documents, the first document in
//! scan order is recorded. Documents arrive sorted by path, so the reason is
//! reproducible whether the scan ran in parallel or not.

use std::path::Path;
use tracing::debug;

use prune_core::file_system::relative_to;

use crate::scanner::ScannedDocument;
use crate::types::{MetadataStore, UsageReason, UsageReasons};

/// `DirectlyUsed` reasons for every plugin referenced by `documents`, with
/// paths made relative to `root`.
pub fn direct_usage_seeds(documents: &[ScannedDocument], root: &Path) -> UsageReasons {
    let mut seeds = UsageReasons::new();

    for document in documents {
        for id in &document.plugins {
            if seeds.contains_key(id) {
                continue;
            }
            let reason = UsageReason::DirectlyUsed(relative_to(&document.path, root));
            seeds.insert(id.clone(), reason);
        }
    }

    seeds
}

/// Append a `BundledCore` seed for every bundled plugin not already seeded.
///
/// Bundled plugins are active even without a reference because the core
/// can rely on them implicitly.
pub fn add_bundled_seeds(seeds: &mut UsageReasons, metadata: &MetadataStore) {
    let mut added = 0usize;
    for id in metadata.bundled_ids() {
        if !seeds.contains_key(id) {
            seeds.insert(id.clone(), UsageReason::BundledCore);
            added += 1;
        }
    }
    debug!(added, "added bundled plugin seeds");
}

/// Full seed map in priority order.
pub fn build_seeds(
    documents: &[ScannedDocument],
    root: &Path,
    metadata: &MetadataStore,
) -> UsageReasons {
    let mut seeds = direct_usage_seeds(documents, root);
    let direct = seeds.len();
    add_bundled_seeds(&mut seeds, metadata);
    debug!(direct, total = seeds.len(), "built seeds");
    seeds
}
