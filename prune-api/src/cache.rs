//! On-disk cache of the raw plugin manager response.
//!
//! Two files live in the cache directory: the JSON body and the unix time
//! it was fetched at. The body is only reused while younger than the TTL.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use prune_core::error::Result;
use prune_core::file_system::write_atomic;

pub const CACHE_FILE: &str = "plugin_api_data.json";
pub const TIMESTAMP_FILE: &str = "plugin_api_data.timestamp";

#[derive(Debug, Clone)]
pub struct MetadataCache {
    dir: PathBuf,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Default location next to the installed-plugins list.
    pub fn default_dir(plugins_file: &Path) -> PathBuf {
        plugins_file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(".migration")
            .join("cache")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The cached body if both files exist and the entry is still fresh.
    pub fn load_fresh(&self) -> Option<String> {
        self.load_fresh_at(Utc::now().timestamp())
    }

    pub fn load_fresh_at(&self, now: i64) -> Option<String> {
        let age = now - self.read_timestamp()?;
        if age >= self.ttl.as_secs() as i64 {
            debug!(age, "Plugin metadata cache expired");
            return None;
        }

        match fs::read_to_string(self.dir.join(CACHE_FILE)) {
            Ok(body) => {
                tracing::info!("Using cached plugin API data ({age}s old)");
                Some(body)
            }
            Err(e) => {
                warn!(error = %e, "Cannot read plugin metadata cache");
                None
            }
        }
    }

    pub fn store(&self, body: &str) -> Result<()> {
        self.store_at(body, Utc::now().timestamp())
    }

    pub fn store_at(&self, body: &str, now: i64) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_atomic(&self.dir.join(CACHE_FILE), |w| w.write_all(body.as_bytes()))?;
        write_atomic(&self.dir.join(TIMESTAMP_FILE), |w| write!(w, "{now}"))?;
        debug!(dir = %self.dir.display(), "Stored plugin metadata cache");
        Ok(())
    }

    fn read_timestamp(&self) -> Option<i64> {
        let raw = fs::read_to_string(self.dir.join(TIMESTAMP_FILE)).ok()?;
        match raw.trim().parse() {
            Ok(timestamp) => Some(timestamp),
            Err(e) => {
                warn!(error = %e, "Ignoring invalid cache timestamp");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_round_trip_while_fresh() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let cache = MetadataCache::new(temp_dir.path().join("cache"), HOUR);

        cache.store_at(r#"{"plugins":[]}"#, 1_000)?;

        assert_eq!(
            cache.load_fresh_at(1_000 + 3_599).as_deref(),
            Some(r#"{"plugins":[]}"#)
        );
        Ok(())
    }

    #[test]
    fn test_expired_entry_is_ignored() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let cache = MetadataCache::new(temp_dir.path(), HOUR);

        cache.store_at("{}", 1_000)?;

        assert!(cache.load_fresh_at(1_000 + 3_600).is_none());
        Ok(())
    }

    #[test]
    fn test_missing_or_invalid_timestamp() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let cache = MetadataCache::new(temp_dir.path(), HOUR);
        assert!(cache.load_fresh_at(0).is_none());

        fs::write(temp_dir.path().join(CACHE_FILE), "{}")?;
        fs::write(temp_dir.path().join(TIMESTAMP_FILE), "yesterday")?;
        assert!(cache.load_fresh_at(0).is_none());
        Ok(())
    }

    #[test]
    fn test_default_dir_next_to_plugins_file() {
        assert_eq!(
            MetadataCache::default_dir(Path::new("/srv/jenkins/plugins.txt")),
            PathBuf::from("/srv/jenkins/.migration/cache")
        );
    }
}
