//! Optional YAML settings file. Every field has a default, so an empty
//! file and no file at all behave the same.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use prune_api::ApiOptions;
use prune_core::concurrency::MAX_SCAN_WORKERS;
use prune_core::error::{PruneError, Result};
use prune_plugin::ScanOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_config_file_name")]
    pub config_file_name: String,
    #[serde(default = "default_top_level_extension")]
    pub top_level_extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Defaults to `.migration/cache` next to the plugins file.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_max_workers() -> usize {
    MAX_SCAN_WORKERS
}

fn default_config_file_name() -> String {
    "config.xml".to_string()
}

fn default_top_level_extension() -> String {
    "xml".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_depth() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            config_file_name: default_config_file_name(),
            top_level_extension: default_top_level_extension(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            depth: default_depth(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ttl_secs: default_ttl_secs(),
            dir: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PruneError::Config(format!("cannot read settings {}: {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| PruneError::Config(format!("invalid settings {}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml_ng::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.scan.config_file_name.trim().is_empty() {
            return Err(PruneError::Config(
                "scan.config_file_name must not be empty".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(PruneError::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            config_file_name: self.scan.config_file_name.clone(),
            top_level_extension: self
                .scan
                .top_level_extension
                .trim_start_matches('.')
                .to_string(),
            max_workers: self.scan.max_workers.min(MAX_SCAN_WORKERS),
        }
    }

    pub fn api_options(&self) -> ApiOptions {
        ApiOptions {
            timeout: Duration::from_secs(self.api.timeout_secs),
            depth: self.api.depth,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_settings_use_defaults() -> Result<()> {
        let settings = Settings::parse("")?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.scan.max_workers, 8);
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.cache.ttl_secs, 3600);
        assert!(settings.cache.enabled);
        Ok(())
    }

    #[test]
    fn test_max_workers_only_lowers_the_cap() -> Result<()> {
        let settings = Settings::parse("scan:\n  max_workers: 64\n")?;
        assert_eq!(settings.scan_options().max_workers, MAX_SCAN_WORKERS);

        let settings = Settings::parse("scan:\n  max_workers: 3\n")?;
        assert_eq!(settings.scan_options().max_workers, 3);
        Ok(())
    }

    #[test]
    fn test_partial_settings() -> Result<()> {
        let settings = Settings::parse(
            r#"
scan:
  max_workers: 2
cache:
  enabled: false
  dir: /tmp/prune-cache
"#,
        )?;
        assert_eq!(settings.scan.max_workers, 2);
        assert_eq!(settings.scan.config_file_name, "config.xml");
        assert!(!settings.cache.enabled);
        assert_eq!(settings.cache.dir, Some(PathBuf::from("/tmp/prune-cache")));
        assert_eq!(settings.api, ApiSettings::default());
        Ok(())
    }

    #[test]
    fn test_scan_options_strip_leading_dot() -> Result<()> {
        let settings = Settings::parse("scan:\n  top_level_extension: .xml\n")?;
        assert_eq!(settings.scan_options().top_level_extension, "xml");
        Ok(())
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(Settings::parse("api:\n  timeout_secs: 0\n").is_err());
        assert!(Settings::parse("scan: [1, 2]\n").is_err());
    }

    #[test]
    fn test_load_missing_file_is_config_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let err = Settings::load(&temp_dir.path().join("prune.yaml")).unwrap_err();
        assert!(matches!(err, PruneError::Config(_)));
        Ok(())
    }
}
