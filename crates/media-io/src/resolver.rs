use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::path_index::PathIndex;
use crate::pathurl::{basename, fold_name, media_class, normalize_recorded_path, split_extension};

/// Raw path value the parser stores when a clip has no file reference.
pub const NO_FILE_MARKER: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Accept the recorded path itself when it still points at a file.
    pub trust_recorded_path: bool,
    /// Fall back to substring matching on the filename stem.
    pub fuzzy: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            trust_recorded_path: true,
            fuzzy: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    RecordedPath,
    ExactName,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved {
        path: PathBuf,
        strategy: MatchStrategy,
    },
    Missing {
        raw_path: String,
        base_dir: PathBuf,
    },
}

impl Resolution {
    pub fn resolved_path(&self) -> Option<&Path> {
        match self {
            Resolution::Resolved { path, .. } => Some(path),
            Resolution::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resolution::Missing { .. })
    }
}

/// Maps recorded media paths onto files that exist now.
///
/// Order: recorded path, exact basename in the index, then (optionally) the
/// first index entry whose name contains the recorded stem. Fuzzy candidates
/// must share the recorded extension or its media class (a `.mp4` never
/// relinks to a `.wav`); ties go to a matching extension, then the shortest
/// path, then the lexicographically smallest path.
pub struct MediaResolver<'a> {
    index: &'a PathIndex,
    base_dir: &'a Path,
    options: ResolverOptions,
    is_file: fn(&Path) -> bool,
}

impl<'a> MediaResolver<'a> {
    pub fn new(index: &'a PathIndex, base_dir: &'a Path) -> Self {
        Self {
            index,
            base_dir,
            options: ResolverOptions::default(),
            is_file: path_is_file,
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the existence check used for every candidate path.
    pub fn with_file_check(mut self, is_file: fn(&Path) -> bool) -> Self {
        self.is_file = is_file;
        self
    }

    pub fn resolve(&self, raw_path: &str) -> Resolution {
        let trimmed = raw_path.trim();
        if trimmed.is_empty() || trimmed == NO_FILE_MARKER {
            return self.missing(raw_path);
        }

        let Some(normalized) = normalize_recorded_path(trimmed, self.base_dir) else {
            debug!(raw = raw_path, "recorded path could not be normalized");
            return self.missing(raw_path);
        };

        if self.options.trust_recorded_path && (self.is_file)(&normalized) {
            return Resolution::Resolved {
                path: normalized,
                strategy: MatchStrategy::RecordedPath,
            };
        }

        let normalized_text = normalized.to_string_lossy();
        let name = fold_name(basename(&normalized_text));
        if name.is_empty() {
            return self.missing(raw_path);
        }

        if let Some(found) = self.index.lookup_exact(&name) {
            if (self.is_file)(found) {
                debug!(raw = raw_path, path = %found.display(), "exact name match");
                return Resolution::Resolved {
                    path: found.to_path_buf(),
                    strategy: MatchStrategy::ExactName,
                };
            }
        }

        if self.options.fuzzy {
            if let Some(found) = self.fuzzy_match(&name) {
                debug!(raw = raw_path, path = %found.display(), "fuzzy name match");
                return Resolution::Resolved {
                    path: found,
                    strategy: MatchStrategy::Fuzzy,
                };
            }
        }

        self.missing(raw_path)
    }

    fn fuzzy_match(&self, name: &str) -> Option<PathBuf> {
        let (stem, ext) = split_extension(name);
        let class = ext.and_then(media_class);
        let mut candidates: Vec<_> = self
            .index
            .fuzzy_candidates(stem)
            .into_iter()
            .filter(|(key, _)| {
                let candidate_ext = split_extension(key).1;
                class.is_none()
                    || candidate_ext == ext
                    || candidate_ext.and_then(media_class) == class
            })
            .collect();
        // Stable sort keeps the index's length/lexicographic order within groups.
        candidates.sort_by_key(|(key, _)| split_extension(key).1 != ext);
        candidates
            .into_iter()
            .map(|(_, path)| path)
            .find(|path| (self.is_file)(path))
            .map(Path::to_path_buf)
    }

    fn missing(&self, raw_path: &str) -> Resolution {
        Resolution::Missing {
            raw_path: raw_path.to_string(),
            base_dir: self.base_dir.to_path_buf(),
        }
    }
}

fn path_is_file(path: &Path) -> bool {
    path.is_file()
}
