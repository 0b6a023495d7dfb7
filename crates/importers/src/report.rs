use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use timeline::PlacementError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MissingReason {
    /// No file on disk could be matched to the recorded path.
    Unresolved,
    /// A file was found but the host refused to place it.
    Rejected { resolved_path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEntry {
    pub raw_path: String,
    /// Base directories resolution was attempted from.
    pub contexts: BTreeSet<PathBuf>,
    /// Names of the clips referencing this path, in placement order.
    pub clips: Vec<String>,
    pub reason: MissingReason,
}

/// Media that could not be placed, one entry per distinct raw path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingReport {
    entries: BTreeMap<String, MissingEntry>,
}

impl MissingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unresolved(&mut self, raw_path: &str, base_dir: &Path, clip_name: &str) {
        self.record(raw_path, base_dir, clip_name, MissingReason::Unresolved);
    }

    pub fn record_rejected(
        &mut self,
        raw_path: &str,
        base_dir: &Path,
        clip_name: &str,
        resolved_path: &Path,
        error: &PlacementError,
    ) {
        self.record(
            raw_path,
            base_dir,
            clip_name,
            MissingReason::Rejected {
                resolved_path: resolved_path.to_path_buf(),
                message: error.to_string(),
            },
        );
    }

    fn record(&mut self, raw_path: &str, base_dir: &Path, clip_name: &str, reason: MissingReason) {
        let entry = self
            .entries
            .entry(raw_path.to_string())
            .or_insert_with(|| MissingEntry {
                raw_path: raw_path.to_string(),
                contexts: BTreeSet::new(),
                clips: Vec::new(),
                reason: reason.clone(),
            });
        entry.contexts.insert(base_dir.to_path_buf());
        entry.clips.push(clip_name.to_string());
        // Rejected sticks once recorded.
        if matches!(entry.reason, MissingReason::Unresolved) {
            entry.reason = reason;
        }
    }

    pub fn get(&self, raw_path: &str) -> Option<&MissingEntry> {
        self.entries.get(raw_path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &MissingEntry> {
        self.entries.values()
    }

    pub fn raw_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_raw_path_collapses() {
        let mut report = MissingReport::new();
        report.record_unresolved("missing.mov", Path::new("/proj"), "Clip 1");
        report.record_unresolved("missing.mov", Path::new("/proj"), "Clip 2");
        report.record_unresolved("other.wav", Path::new("/proj"), "Clip 3");

        assert_eq!(report.len(), 2);
        let entry = report.get("missing.mov").unwrap();
        assert_eq!(entry.clips, vec!["Clip 1", "Clip 2"]);
        assert_eq!(entry.contexts.len(), 1);
        assert_eq!(report.raw_paths().collect::<Vec<_>>(), vec!["missing.mov", "other.wav"]);
    }

    #[test]
    fn test_rejection_overrides_unresolved() {
        let mut report = MissingReport::new();
        report.record_unresolved("a.mov", Path::new("/one"), "A");
        report.record_rejected(
            "a.mov",
            Path::new("/two"),
            "A2",
            Path::new("/two/a.mov"),
            &PlacementError::Rejected("codec".to_string()),
        );
        let entry = report.get("a.mov").unwrap();
        assert_eq!(entry.contexts.len(), 2);
        assert!(matches!(entry.reason, MissingReason::Rejected { .. }));
    }
}
