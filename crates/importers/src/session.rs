use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use media_io::{MediaResolver, PathIndex, Resolution, ResolverOptions};
use timeline::{PlacementRequest, Sequence, TimelineHost, TimelineSettings};

use crate::fcp7xml::parse_document;
use crate::report::MissingReport;
use crate::{ImportConfig, ImportError};

/// Position of a clip inside the parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClipRef {
    sequence: usize,
    track: usize,
    clip: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    /// Strips placed by this pass.
    pub placed: usize,
    /// Clips still waiting for media after this pass, keyed by raw path.
    pub missing: MissingReport,
}

/// One import of one document.
///
/// The document is parsed once. The first [`run`](Self::run) configures every
/// sequence and places what it can; [`retry_with`](Self::retry_with) extends
/// the search index and places only clips that are still pending, so strips
/// from earlier passes are never duplicated or removed.
pub struct ImportSession {
    document: PathBuf,
    base_dir: PathBuf,
    sequences: Vec<Sequence>,
    index: PathIndex,
    options: ResolverOptions,
    pending: Vec<ClipRef>,
    configured: bool,
    placed_total: usize,
}

impl ImportSession {
    pub fn open(document: &Path, config: &ImportConfig) -> Result<Self, ImportError> {
        let sequences = parse_document(document)?;
        Ok(Self::from_sequences(document, sequences, config))
    }

    /// Session over an already parsed document. `document` only sets the
    /// base directory relative paths are resolved against.
    pub fn from_sequences(document: &Path, sequences: Vec<Sequence>, config: &ImportConfig) -> Self {
        let base_dir = match document.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut index = PathIndex::build(&[base_dir.as_path()]);
        if !config.search_dirs.is_empty() {
            index.extend(config.search_dirs.as_slice());
        }

        let pending = sequences
            .iter()
            .enumerate()
            .flat_map(|(s, seq)| {
                seq.tracks.iter().enumerate().flat_map(move |(t, track)| {
                    (0..track.clips.len()).map(move |c| ClipRef {
                        sequence: s,
                        track: t,
                        clip: c,
                    })
                })
            })
            .collect();

        Self {
            document: document.to_path_buf(),
            base_dir,
            sequences,
            index,
            options: config.resolver_options(),
            pending,
            configured: false,
            placed_total: 0,
        }
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    /// Strips placed across all passes.
    pub fn placed_total(&self) -> usize {
        self.placed_total
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Configure each sequence's timeline and place every resolvable clip.
    /// Calling it again after the first pass behaves like a retry with no
    /// new directories.
    pub fn run<H: TimelineHost>(&mut self, host: &mut H) -> ImportOutcome {
        self.place_pending(host)
    }

    /// Add search directories and place clips that were missing before.
    pub fn retry_with<H: TimelineHost, P: AsRef<Path>>(
        &mut self,
        search_dirs: &[P],
        host: &mut H,
    ) -> ImportOutcome {
        let walked = self.index.extend(search_dirs);
        debug!(walked, "search directories added for retry");
        self.place_pending(host)
    }

    fn place_pending<H: TimelineHost>(&mut self, host: &mut H) -> ImportOutcome {
        let resolver = MediaResolver::new(&self.index, &self.base_dir).with_options(self.options);
        let mut outcome = ImportOutcome::default();
        let mut still_pending = Vec::new();
        let first_pass = !self.configured;
        let mut pending = self.pending.iter().copied().peekable();

        for (s, sequence) in self.sequences.iter().enumerate() {
            let has_work = pending.peek().is_some_and(|at| at.sequence == s);
            if !first_pass && !has_work {
                continue;
            }

            info!(
                sequence = %sequence.name,
                width = sequence.width,
                height = sequence.height,
                fps = sequence.frame_rate,
                "configuring timeline"
            );
            host.configure_timeline(&TimelineSettings::for_sequence(s, sequence));

            while let Some(at) = pending.next_if(|at| at.sequence == s) {
                let Some(clip) = sequence
                    .tracks
                    .get(at.track)
                    .and_then(|track| track.clips.get(at.clip))
                else {
                    continue;
                };

                match resolver.resolve(&clip.raw_file_path) {
                    Resolution::Resolved { path, strategy } => {
                        let request = PlacementRequest::new(clip, &path);
                        match host.place_clip(&request) {
                            Ok(strip) => {
                                debug!(
                                    clip = %clip.name,
                                    path = %path.display(),
                                    ?strategy,
                                    %strip,
                                    "placed clip"
                                );
                                outcome.placed += 1;
                            }
                            Err(e) => {
                                warn!(clip = %clip.name, path = %path.display(), "placement failed: {}", e);
                                outcome.missing.record_rejected(
                                    &clip.raw_file_path,
                                    &self.base_dir,
                                    &clip.name,
                                    &path,
                                    &e,
                                );
                                still_pending.push(at);
                            }
                        }
                    }
                    Resolution::Missing { raw_path, base_dir } => {
                        warn!(clip = %clip.name, raw = %raw_path, "media not found");
                        outcome
                            .missing
                            .record_unresolved(&raw_path, &base_dir, &clip.name);
                        still_pending.push(at);
                    }
                }
            }
        }

        self.configured = true;
        self.pending = still_pending;
        self.placed_total += outcome.placed;
        info!(
            placed = outcome.placed,
            missing = outcome.missing.len(),
            total_placed = self.placed_total,
            "import pass finished"
        );
        outcome
    }
}

/// Parse `document`, index its directory plus `extra_dirs`, and place every
/// clip on `host`.
pub fn import_document<H: TimelineHost, P: AsRef<Path>>(
    document: &Path,
    extra_dirs: &[P],
    host: &mut H,
) -> Result<ImportOutcome, ImportError> {
    let config = ImportConfig {
        search_dirs: extra_dirs.iter().map(|d| d.as_ref().to_path_buf()).collect(),
        ..ImportConfig::default()
    };
    let mut session = ImportSession::open(document, &config)?;
    Ok(session.run(host))
}
