use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PruneError {
    Config(String),
    Io(#[from] std::io::Error),
    /// The installed-plugins list could not be read. Aborts the run.
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A configuration document could not be parsed. Never fatal.
    Scan {
        path: PathBuf,
        message: String,
    },
    /// Plugin metadata could not be obtained. Never fatal.
    Metadata(String),
    Serialization(String),
    Other(#[from] anyhow::Error),
}

impl Display for PruneError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PruneError::Config(s) => write!(f, "Configuration error: {}", s),
            PruneError::Io(e) => write!(f, "I/O error: {}", e),
            PruneError::Input { path, source } => {
                write!(
                    f,
                    "Cannot read installed plugins list {}: {}",
                    path.display(),
                    source
                )
            }
            PruneError::Scan { path, message } => {
                write!(f, "Cannot parse XML {}: {}", path.display(), message)
            }
            PruneError::Metadata(s) => write!(f, "Plugin metadata unavailable: {}", s),
            PruneError::Serialization(s) => write!(f, "Serialization error: {}", s),
            PruneError::Other(e) => write!(f, "Other error: {}", e),
        }
    }
}

impl PruneError {
    /// Whether this error must stop the analysis.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PruneError::Scan { .. } | PruneError::Metadata(_))
    }
}

impl From<serde_yaml_ng::Error> for PruneError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        PruneError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PruneError {
    fn from(err: serde_json::Error) -> Self {
        PruneError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PruneError>;
