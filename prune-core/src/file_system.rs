//! Filesystem helpers shared by the pipeline stages.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::Result;

/// Write a file atomically: the content goes to a temporary file in the
/// destination directory, which is then renamed over `path`.
///
/// The temporary file is removed on every early return.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(&dir)?;

    let temp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| e.error)?;

    tracing::debug!(path = %path.display(), "wrote file");
    Ok(())
}

/// Path of `path` relative to `root`, or `path` itself when it is outside `root`.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
