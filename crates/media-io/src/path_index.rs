use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::pathurl::{basename, fold_name};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexBuildWarning {
    #[error("search root does not exist: {0}")]
    MissingRoot(PathBuf),
    #[error("search root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("skipped unreadable entry under {root}: {message}")]
    Unreadable { root: PathBuf, message: String },
}

/// Case-insensitive filename lookup over one or more directory trees.
///
/// Keys are folded basenames. When two trees hold the same basename the one
/// indexed last wins; roots are walked in the order given and entries within
/// a root in file-name order, so the outcome is stable across runs.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    entries: HashMap<String, PathBuf>,
    roots: Vec<PathBuf>,
    warnings: Vec<IndexBuildWarning>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<P: AsRef<Path>>(roots: &[P]) -> Self {
        let mut index = Self::new();
        index.extend(roots);
        index
    }

    /// Merge more roots into the index without discarding existing entries.
    /// A root that was already indexed is walked again, so files added since
    /// are picked up and it becomes the latest writer. Returns the number of
    /// files walked.
    pub fn extend<P: AsRef<Path>>(&mut self, roots: &[P]) -> usize {
        let mut walked = 0;
        for root in roots {
            walked += self.index_root(root.as_ref());
        }
        info!(
            roots = self.roots.len(),
            files = self.entries.len(),
            "path index updated"
        );
        walked
    }

    fn index_root(&mut self, root: &Path) -> usize {
        let root = match root.canonicalize() {
            Ok(r) => r,
            Err(_) => {
                warn!(root = %root.display(), "search root does not exist, skipping");
                self.warnings
                    .push(IndexBuildWarning::MissingRoot(root.to_path_buf()));
                return 0;
            }
        };
        if !root.is_dir() {
            warn!(root = %root.display(), "search root is not a directory, skipping");
            self.warnings.push(IndexBuildWarning::NotADirectory(root));
            return 0;
        }
        let rewalk = self.roots.contains(&root);
        info!(root = %root.display(), rewalk, "indexing search root");
        let mut walked = 0;
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("walk error under {}: {}", root.display(), e);
                    self.warnings.push(IndexBuildWarning::Unreadable {
                        root: root.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let key = fold_name(&entry.file_name().to_string_lossy());
            self.entries.insert(key, entry.into_path());
            walked += 1;
        }
        if !rewalk {
            self.roots.push(root);
        }
        walked
    }

    /// Exact, case-insensitive lookup of a filename. Any directory part of
    /// `filename` is ignored.
    pub fn lookup_exact(&self, filename: &str) -> Option<&Path> {
        let key = fold_name(basename(filename));
        self.entries.get(&key).map(PathBuf::as_path)
    }

    /// Indexed entries whose folded key contains `needle` (folded here).
    /// Ordered by shortest path, then lexicographically.
    pub fn fuzzy_candidates(&self, needle: &str) -> Vec<(&str, &Path)> {
        let needle = fold_name(needle);
        if needle.is_empty() {
            return Vec::new();
        }
        let mut found: Vec<(&str, &Path)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.contains(&needle))
            .map(|(key, path)| (key.as_str(), path.as_path()))
            .collect();
        found.sort_by(|a, b| {
            let a_len = a.1.as_os_str().len();
            let b_len = b.1.as_os_str().len();
            a_len.cmp(&b_len).then_with(|| a.1.cmp(b.1))
        });
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn warnings(&self) -> &[IndexBuildWarning] {
        &self.warnings
    }
}
