use media_io::ResolverOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod fcp7xml;
pub mod report;
pub mod session;
pub mod xml;

pub use fcp7xml::{parse_document, parse_str};
pub use report::{MissingEntry, MissingReason, MissingReport};
pub use session::{import_document, ImportOutcome, ImportSession};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document at byte {position}: {reason}")]
    MalformedDocument { position: u64, reason: String },
    #[error("invalid import config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Import settings, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Indexed in addition to the document's own directory.
    pub search_dirs: Vec<PathBuf>,
    pub fuzzy_match: bool,
    pub trust_recorded_path: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            fuzzy_match: true,
            trust_recorded_path: true,
        }
    }
}

impl ImportConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            trust_recorded_path: self.trust_recorded_path,
            fuzzy: self.fuzzy_match,
        }
    }
}
