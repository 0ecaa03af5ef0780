//! Output files: the cleaned plugins list and the unused-plugins report.

use std::io::{self, Write};
use std::path::Path;

use prune_core::error::Result;
use prune_core::file_system::write_atomic;
use prune_plugin::{ActivePluginSet, InstalledPlugins, UnusedPluginSet};

pub const CLEANED_HEADER: &str = "# Jenkins Plugin Analysis Report\n\
# Unused plugins have been removed. Kept plugins include a comment explaining why.\n";
pub const NO_UNUSED_HEADER: &str = "# No unused plugins were found.";
pub const UNUSED_HEADER: &str =
    "# The following plugins were identified as unused and have been removed:";

/// Active plugins sorted by id, each preceded by the reason it is kept.
pub fn render_cleaned(
    active: &ActivePluginSet,
    installed: &InstalledPlugins,
    w: &mut dyn Write,
) -> io::Result<()> {
    write!(w, "{CLEANED_HEADER}")?;
    writeln!(w)?;

    for (id, reason) in active.sorted() {
        writeln!(w, "# Kept because: {reason}")?;
        writeln!(w, "{}", installed.pinned_line(id))?;
        writeln!(w)?;
    }
    Ok(())
}

pub fn render_report(unused: &UnusedPluginSet, w: &mut dyn Write) -> io::Result<()> {
    if unused.is_empty() {
        return writeln!(w, "{NO_UNUSED_HEADER}");
    }

    writeln!(w, "{UNUSED_HEADER}")?;
    for id in unused {
        writeln!(w, "{id}")?;
    }
    Ok(())
}

pub fn write_cleaned_plugins(
    path: &Path,
    active: &ActivePluginSet,
    installed: &InstalledPlugins,
) -> Result<()> {
    write_atomic(path, |w| render_cleaned(active, installed, w))
}

pub fn write_unused_report(path: &Path, unused: &UnusedPluginSet) -> Result<()> {
    write_atomic(path, |w| render_report(unused, w))
}
