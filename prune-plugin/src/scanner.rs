//! Discovery and parsing of configuration documents under a Jenkins home.
//!
//! Every document is parsed independently, so the batch fans out over a
//! bounded rayon pool and the results come back in discovery order.

use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexSet;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use prune_core::concurrency::{worker_count, MAX_SCAN_WORKERS};
use prune_core::error::PruneError;

use crate::types::PluginId;

/// Attribute carrying `<id>@<version>` on Jenkins configuration elements.
pub const PLUGIN_ATTRIBUTE: &str = "plugin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Documents with this file name are collected at any depth.
    pub config_file_name: String,
    /// Files directly under the root with this extension are collected too.
    pub top_level_extension: String,
    /// Worker cap for the parallel scan.
    pub max_workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_file_name: "config.xml".to_string(),
            top_level_extension: "xml".to_string(),
            max_workers: MAX_SCAN_WORKERS,
        }
    }
}

/// Plugins referenced by one configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDocument {
    pub path: PathBuf,
    /// Unique ids in order of first appearance.
    pub plugins: IndexSet<PluginId>,
    /// Set when the document could not be read or parsed; `plugins` is then empty.
    pub warning: Option<String>,
}

impl ScannedDocument {
    pub fn is_ok(&self) -> bool {
        self.warning.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl ConfigScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, ScanOptions::default())
    }

    pub fn with_options(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All configuration documents, sorted by path and without duplicates.
    ///
    /// Unreadable directories are logged and skipped.
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();

        match fs::read_dir(&self.root) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
                    if is_file && self.has_top_level_extension(&path) {
                        found.insert(path);
                    }
                }
            }
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Cannot list Jenkins home");
                return Vec::new();
            }
        }

        for entry in WalkDir::new(&self.root).follow_links(false) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file()
                        && entry.file_name() == self.options.config_file_name.as_str()
                    {
                        found.insert(entry.into_path());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                }
            }
        }

        debug!(root = %self.root.display(), count = found.len(), "discovered configuration documents");
        found.into_iter().collect()
    }

    /// Lazily scan documents one at a time, in discovery order.
    pub fn documents(&self) -> impl Iterator<Item = ScannedDocument> {
        self.discover()
            .into_iter()
            .map(|path| scan_document(&path))
    }

    /// Scan every document, fanning out over at most
    /// `min(cpus, documents, max_workers)` threads.
    ///
    /// The result is in discovery order regardless of the worker count.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> Vec<ScannedDocument> {
        let paths = self.discover();
        let workers = worker_count(paths.len(), self.options.max_workers);

        if paths.len() <= 1 || workers <= 1 {
            debug!(documents = paths.len(), "scanning sequentially");
            return paths.iter().map(|path| scan_document(path)).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => {
                debug!(documents = paths.len(), workers, "scanning in parallel");
                pool.install(|| paths.par_iter().map(|path| scan_document(path)).collect())
            }
            Err(e) => {
                warn!(error = %e, "Cannot start scan workers, scanning sequentially");
                paths.iter().map(|path| scan_document(path)).collect()
            }
        }
    }

    fn has_top_level_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.options.top_level_extension.as_str())
    }
}

/// Read and parse one document. Failures are reported on the result,
/// never returned as errors.
pub fn scan_document(path: &Path) -> ScannedDocument {
    let outcome = fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| {
            let content = decode_document(&bytes)?;
            extract_plugin_ids(&content).map_err(|e| e.to_string())
        });

    match outcome {
        Ok(plugins) => ScannedDocument {
            path: path.to_path_buf(),
            plugins,
            warning: None,
        },
        Err(message) => {
            let err = PruneError::Scan {
                path: path.to_path_buf(),
                message,
            };
            warn!("{err}");
            ScannedDocument {
                path: path.to_path_buf(),
                plugins: IndexSet::new(),
                warning: Some(err.to_string()),
            }
        }
    }
}

/// Decode raw document bytes to text.
///
/// A byte order mark wins, then the `encoding` named in the XML declaration,
/// then UTF-8. Bytes that are invalid in the chosen encoding are an error.
pub fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>, String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => (encoding, &bytes[bom_length..]),
        None => (declared_encoding(bytes).unwrap_or(UTF_8), bytes),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| format!("stream did not contain valid {}", encoding.name()))
}

/// Encoding label from an ASCII-compatible `<?xml ... encoding='...'?>` prolog.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let prolog = bytes.strip_prefix(b"<?xml")?;
    let end = prolog.windows(2).position(|pair| pair == b"?>")?;
    let prolog = &prolog[..end];

    let start = prolog.windows(8).position(|w| w == b"encoding")? + 8;
    let rest = prolog[start..].trim_ascii_start().strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let label = &rest[..rest.iter().position(|&b| b == quote)?];
    Encoding::for_label(label).filter(|encoding| encoding.is_ascii_compatible())
}

/// Plugin ids from every `plugin` attribute in an XML document, root included.
///
/// Documents with a DOCTYPE declaration are accepted.
pub fn extract_plugin_ids(xml: &str) -> Result<IndexSet<PluginId>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(xml, options)?;

    Ok(document
        .descendants()
        .filter(|node| node.is_element())
        .filter_map(|node| node.attribute(PLUGIN_ATTRIBUTE))
        .filter_map(PluginId::from_attribute)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FREESTYLE_JOB: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<project>
  <scm class="hudson.plugins.git.GitSCM" plugin="git@5.2.0">
    <userRemoteConfigs>
      <hudson.plugins.git.UserRemoteConfig/>
    </userRemoteConfigs>
  </scm>
  <builders>
    <hudson.tasks.Shell/>
  </builders>
  <publishers>
    <hudson.tasks.Mailer plugin="mailer@472.vf7c289a_4b_420"/>
    <hudson.plugins.git.GitPublisher plugin="git@5.2.0"/>
  </publishers>
</project>
"#;

    fn write(root: &Path, relative: &str, content: &str) -> anyhow::Result<PathBuf> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    fn write_bytes(root: &Path, relative: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    fn ids(document: &ScannedDocument) -> Vec<&str> {
        document.plugins.iter().map(PluginId::as_str).collect()
    }

    #[test]
    fn test_extract_plugin_ids_nested_and_deduplicated() -> anyhow::Result<()> {
        let plugins = extract_plugin_ids(FREESTYLE_JOB)?;
        let plugins: Vec<&str> = plugins.iter().map(PluginId::as_str).collect();
        assert_eq!(plugins, vec!["git", "mailer"]);
        Ok(())
    }

    #[test]
    fn test_extract_includes_root_element() -> anyhow::Result<()> {
        let xml = r#"<flow-definition plugin="workflow-job@1400.v7fd111b_ec82f">
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition" plugin="workflow-cps"/>
</flow-definition>"#;
        let plugins = extract_plugin_ids(xml)?;
        let plugins: Vec<&str> = plugins.iter().map(PluginId::as_str).collect();
        assert_eq!(plugins, vec!["workflow-job", "workflow-cps"]);
        Ok(())
    }

    #[test]
    fn test_extract_rejects_malformed_xml() {
        assert!(extract_plugin_ids("<project><scm plugin=\"git@1\"></project>").is_err());
        assert!(extract_plugin_ids("not xml at all").is_err());
    }

    #[test]
    fn test_extract_accepts_doctype() -> anyhow::Result<()> {
        let xml = "<?xml version='1.0'?>\n<!DOCTYPE project>\n<project><scm plugin=\"git@5.2.0\"/></project>";
        let plugins = extract_plugin_ids(xml)?;
        let plugins: Vec<&str> = plugins.iter().map(PluginId::as_str).collect();
        assert_eq!(plugins, vec!["git"]);
        Ok(())
    }

    #[test]
    fn test_latin1_document_keeps_plugins() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let mut content =
            b"<?xml version='1.0' encoding='ISO-8859-1'?>\n<project><description>M".to_vec();
        content.push(0xFC);
        content.extend_from_slice(b"nchen</description><scm plugin=\"git@5.2.0\"/></project>");
        let path = write_bytes(temp_dir.path(), "jobs/app/config.xml", &content)?;

        let document = scan_document(&path);
        assert!(document.is_ok(), "{:?}", document.warning);
        assert_eq!(ids(&document), vec!["git"]);
        Ok(())
    }

    #[test]
    fn test_decode_document_honours_bom_and_default() {
        let with_bom = b"\xEF\xBB\xBF<project plugin=\"a@1\"/>";
        assert_eq!(
            decode_document(with_bom).as_deref(),
            Ok("<project plugin=\"a@1\"/>")
        );

        let mut utf16 = vec![0xFF, 0xFE];
        for unit in "<p plugin=\"b@1\"/>".encode_utf16() {
            utf16.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_document(&utf16).as_deref(), Ok("<p plugin=\"b@1\"/>"));

        let invalid_utf8 = b"<project>\xFC</project>";
        assert!(decode_document(invalid_utf8).is_err());
    }

    #[test]
    fn test_discover_top_level_and_nested_config() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        write(root, "config.xml", "<hudson/>")?;
        write(root, "hudson.tasks.Mailer.xml", "<hudson.tasks.Mailer_-DescriptorImpl/>")?;
        write(root, "jobs/app/config.xml", "<project/>")?;
        write(root, "jobs/app/builds/1/build.xml", "<build/>")?;
        write(root, "nodes/agent-1/config.xml", "<slave/>")?;
        write(root, "notes.txt", "not a document")?;

        let scanner = ConfigScanner::new(root);
        let discovered: Vec<PathBuf> = scanner
            .discover()
            .into_iter()
            .map(|p| p.strip_prefix(root).map(Path::to_path_buf))
            .collect::<Result<_, _>>()?;

        assert_eq!(
            discovered,
            vec![
                PathBuf::from("config.xml"),
                PathBuf::from("hudson.tasks.Mailer.xml"),
                PathBuf::from("jobs/app/config.xml"),
                PathBuf::from("nodes/agent-1/config.xml"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_discover_missing_root_is_empty() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let scanner = ConfigScanner::new(temp_dir.path().join("missing"));
        assert!(scanner.discover().is_empty());
        assert!(scanner.scan().is_empty());
        Ok(())
    }

    #[test]
    fn test_malformed_document_does_not_stop_scan() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        write(root, "jobs/a/config.xml", FREESTYLE_JOB)?;
        write(root, "jobs/b/config.xml", "<project><broken></project>")?;
        write(
            root,
            "jobs/c/config.xml",
            r#"<project><scm plugin="subversion@2.17.3"/></project>"#,
        )?;

        let documents = ConfigScanner::new(root).scan();
        assert_eq!(documents.len(), 3);

        assert!(documents[0].is_ok());
        assert_eq!(ids(&documents[0]), vec!["git", "mailer"]);

        assert!(!documents[1].is_ok());
        assert!(documents[1].plugins.is_empty());
        assert!(documents[1]
            .warning
            .as_deref()
            .is_some_and(|w| w.contains("Cannot parse XML")));

        assert!(documents[2].is_ok());
        assert_eq!(ids(&documents[2]), vec!["subversion"]);
        Ok(())
    }

    #[test]
    fn test_parallel_and_sequential_scans_agree() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        for i in 0..24 {
            write(
                root,
                &format!("jobs/job-{i:02}/config.xml"),
                &format!(r#"<project><a plugin="plugin-{i}@1.0"/><b plugin="shared@2"/></project>"#),
            )?;
        }

        let parallel = ConfigScanner::new(root).scan();
        let sequential = ConfigScanner::with_options(
            root,
            ScanOptions {
                max_workers: 1,
                ..ScanOptions::default()
            },
        )
        .scan();
        let lazy: Vec<ScannedDocument> = ConfigScanner::new(root).documents().collect();

        assert_eq!(parallel.len(), 24);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel, lazy);
        Ok(())
    }

    #[test]
    fn test_custom_config_file_name() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        write(root, "jobs/a/config.xml", "<project/>")?;
        write(root, "jobs/a/job.xml", "<project/>")?;

        let scanner = ConfigScanner::with_options(
            root,
            ScanOptions {
                config_file_name: "job.xml".to_string(),
                ..ScanOptions::default()
            },
        );
        let discovered = scanner.discover();
        assert_eq!(discovered.len(), 1);
        assert!(discovered[0].ends_with("jobs/a/job.xml"));
        Ok(())
    }
}
