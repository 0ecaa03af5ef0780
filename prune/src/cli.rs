// External crates
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, warn};

// Internal imports
use prune_api::Credentials;
use prune_core::concurrency::MAX_SCAN_WORKERS;
use prune_core::error::Result;
use prune_core::{prune_info, prune_println, prune_success, prune_warning};

use crate::analysis::{self, AnalysisConfig};
use crate::settings::Settings;

/// Command-line arguments for jenkins-prune.
///
/// Scans a JENKINS_HOME for plugin references, expands them through the
/// plugin dependency graph reported by the controller, and writes a
/// plugins list without the plugins nothing uses.
#[derive(Parser, Debug)]
#[command(name = "jenkins-prune")]
#[command(about = "Analyze Jenkins plugins to find unused ones")]
#[command(version)]
pub struct Args {
    /// Path to JENKINS_HOME
    #[arg(long, value_name = "DIR")]
    pub jenkins_home: PathBuf,

    /// Path to the installed plugins list (plugins.txt)
    #[arg(long, value_name = "FILE")]
    pub plugins_file: PathBuf,

    /// Where to write the cleaned plugins list
    #[arg(long, value_name = "FILE")]
    pub output_file: PathBuf,

    /// Where to write the report of unused plugins
    #[arg(long, value_name = "FILE")]
    pub report_file: PathBuf,

    /// Jenkins URL for API access
    #[arg(long, env = "JENKINS_URL")]
    pub jenkins_url: Option<String>,

    /// Jenkins user for API access
    #[arg(long, env = "JENKINS_USER")]
    pub jenkins_user: Option<String>,

    /// Jenkins API token
    #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
    pub jenkins_token: Option<String>,

    /// YAML settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ignore the plugin metadata cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of scan workers
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,
}

impl Args {
    /// Settings file merged with command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if self.no_cache {
            settings.cache.enabled = false;
        }
        if let Some(jobs) = self.jobs {
            settings.scan.max_workers = usize::from(jobs).min(MAX_SCAN_WORKERS);
        }
        Ok(settings)
    }

    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(
            self.jenkins_url.clone(),
            self.jenkins_user.clone(),
            self.jenkins_token.clone(),
        )
    }

    pub fn into_config(self) -> Result<AnalysisConfig> {
        let settings = self.settings()?;
        let credentials = self.credentials();
        Ok(AnalysisConfig {
            jenkins_home: self.jenkins_home,
            plugins_file: self.plugins_file,
            output_file: self.output_file,
            report_file: self.report_file,
            credentials,
            settings,
        })
    }
}

pub fn execute(args: Args) -> Result<()> {
    let config = args.into_config()?;
    debug!(settings = ?config.settings, "Resolved settings");

    if !config.jenkins_home.is_dir() {
        warn!(
            jenkins_home = %config.jenkins_home.display(),
            "JENKINS_HOME is not a directory; no configuration will be scanned"
        );
    }

    let outcome = analysis::run(&config)?;

    if outcome.metadata_plugins > 0 {
        prune_info!(
            "Resolved dependencies using metadata for {} plugins",
            outcome.metadata_plugins
        );
    }
    if outcome.scan_warnings > 0 {
        prune_warning!(
            "{} of {} configuration files could not be parsed and were skipped",
            outcome.scan_warnings,
            outcome.documents
        );
    }
    prune_success!("Cleaned plugins list written to {}", config.output_file.display());
    prune_success!("Unused plugins report written to {}", config.report_file.display());
    prune_println!("{}", outcome.summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const REQUIRED: [&str; 9] = [
        "jenkins-prune",
        "--jenkins-home",
        "/var/jenkins_home",
        "--plugins-file",
        "plugins.txt",
        "--output-file",
        "plugins.cleaned.txt",
        "--report-file",
        "unused.txt",
    ];

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_to_settings() -> Result<()> {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--no-cache", "--jobs", "3"]);
        let args = Args::try_parse_from(argv).expect("valid arguments");

        let settings = args.settings()?;
        assert!(!settings.cache.enabled);
        assert_eq!(settings.scan.max_workers, 3);
        Ok(())
    }

    #[test]
    fn test_jobs_cannot_exceed_worker_cap() -> Result<()> {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--jobs", "32"]);
        let args = Args::try_parse_from(argv).expect("valid arguments");

        assert_eq!(args.settings()?.scan.max_workers, MAX_SCAN_WORKERS);
        Ok(())
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--jobs", "0"]);
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_missing_required_argument() {
        assert!(Args::try_parse_from(REQUIRED[..7].to_vec()).is_err());
    }

    #[test]
    fn test_partial_credentials_are_ignored() {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--jenkins-url", "https://ci.example.com", "--jenkins-user", "admin"]);
        let args = Args::try_parse_from(argv).expect("valid arguments");
        if std::env::var_os("JENKINS_TOKEN").is_none() {
            assert!(args.credentials().is_none());
        }
    }
}
