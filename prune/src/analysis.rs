//! The analysis pipeline: installed list, metadata, scan, closure, diff, output.

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use prune_api::{
    load_or_empty, ApiMetadataSource, Credentials, JenkinsClient, MetadataCache, MetadataSource,
    StaticMetadataSource,
};
use prune_core::error::Result;
use prune_plugin::{
    build_seeds, resolve, unused, ActivePluginSet, ConfigScanner, InstalledPlugins, MetadataStore,
    ScannedDocument, UnusedPluginSet,
};

use crate::report;
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub jenkins_home: PathBuf,
    pub plugins_file: PathBuf,
    pub output_file: PathBuf,
    pub report_file: PathBuf,
    pub credentials: Option<Credentials>,
    pub settings: Settings,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub active: ActivePluginSet,
    pub unused: UnusedPluginSet,
    pub documents: usize,
    pub scan_warnings: usize,
    pub metadata_plugins: usize,
}

impl AnalysisOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Plugin analysis complete: {} active, {} unused plugins found.",
            self.active.len(),
            self.unused.len()
        )
    }
}

/// Closure and diff over already collected inputs. No I/O.
pub fn analyze(
    installed: &InstalledPlugins,
    documents: &[ScannedDocument],
    jenkins_home: &Path,
    metadata: &MetadataStore,
) -> (ActivePluginSet, UnusedPluginSet) {
    let seeds = build_seeds(documents, jenkins_home, metadata);
    let active = resolve(&seeds, metadata);
    let unused = unused(&installed.ids(), &active);
    (active, unused)
}

/// Run the whole analysis and write both output files.
///
/// Only an unreadable plugins list or an output write failure is an error;
/// broken documents and missing metadata degrade the result instead.
#[instrument(skip_all, fields(jenkins_home = %config.jenkins_home.display()))]
pub fn run(config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    let installed = InstalledPlugins::load(&config.plugins_file)?;
    info!(installed = installed.len(), "Read installed plugins");

    let metadata = load_or_empty(metadata_source(config).as_ref());

    let scanner =
        ConfigScanner::with_options(&config.jenkins_home, config.settings.scan_options());
    let documents = scanner.scan();
    let scan_warnings = documents.iter().filter(|d| !d.is_ok()).count();
    info!(documents = documents.len(), scan_warnings, "Scanned configuration documents");

    let (active, unused) = analyze(&installed, &documents, &config.jenkins_home, &metadata);

    report::write_cleaned_plugins(&config.output_file, &active, &installed)?;
    report::write_unused_report(&config.report_file, &unused)?;

    Ok(AnalysisOutcome {
        active,
        unused,
        documents: documents.len(),
        scan_warnings,
        metadata_plugins: metadata.len(),
    })
}

fn metadata_source(config: &AnalysisConfig) -> Box<dyn MetadataSource> {
    let Some(credentials) = config.credentials.clone() else {
        warn!("Jenkins API credentials not provided. Dependency resolution may be incomplete.");
        return Box::new(StaticMetadataSource::default());
    };

    let client = match JenkinsClient::new(credentials, config.settings.api_options()) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Cannot create Jenkins API client");
            return Box::new(StaticMetadataSource::default());
        }
    };

    let cache = config.settings.cache.enabled.then(|| {
        let dir = config
            .settings
            .cache
            .dir
            .clone()
            .unwrap_or_else(|| MetadataCache::default_dir(&config.plugins_file));
        MetadataCache::new(dir, config.settings.cache_ttl())
    });

    Box::new(ApiMetadataSource::new(client, cache))
}
