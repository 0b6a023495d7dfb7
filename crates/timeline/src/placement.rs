use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Clip, ClipKind, Frame};

/// Strip geometry derived from a clip's timeline position and source trim.
///
/// Inverted trims give zero or negative durations; the arithmetic saturates
/// instead of overflowing and the host decides what to do with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub start: Frame,
    pub offset_start: Frame,
    pub final_end: Frame,
    pub final_duration: Frame,
    pub channel: u32,
}

impl Placement {
    pub fn for_clip(clip: &Clip) -> Self {
        let final_duration = clip.source_out.saturating_sub(clip.source_in);
        Self {
            start: clip.timeline_start.saturating_sub(clip.source_in),
            offset_start: clip.timeline_start,
            final_end: clip.timeline_start.saturating_add(final_duration),
            final_duration,
            channel: clip.kind.channel(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub kind: ClipKind,
    pub name: String,
    pub source_path: PathBuf,
    pub channel: u32,
    pub start: Frame,
    pub offset_start: Frame,
    pub final_end: Frame,
    pub final_duration: Frame,
}

impl PlacementRequest {
    pub fn new(clip: &Clip, source_path: &Path) -> Self {
        let placement = Placement::for_clip(clip);
        Self {
            kind: clip.kind,
            name: clip.name.clone(),
            source_path: source_path.to_path_buf(),
            channel: placement.channel,
            start: placement.start,
            offset_start: placement.offset_start,
            final_end: placement.final_end,
            final_duration: placement.final_duration,
        }
    }

    /// Zero or negative length, from an inverted or empty source trim.
    pub fn is_degenerate(&self) -> bool {
        self.final_duration <= 0
    }
}
