use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::{Frame, PlacementRequest, Sequence};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StripId(pub Uuid);

impl StripId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StripId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scene-level setup requested once per sequence, before any of its clips.
///
/// `sequence_index` is the sequence's position in the document and is the
/// only field guaranteed unique; names and formats may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSettings {
    pub sequence_index: usize,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_frames: Frame,
    pub frame_start: Frame,
    pub frame_end: Frame,
}

impl TimelineSettings {
    pub fn for_sequence(sequence_index: usize, sequence: &Sequence) -> Self {
        Self {
            sequence_index,
            name: sequence.name.clone(),
            width: sequence.width,
            height: sequence.height,
            fps: sequence.frame_rate,
            duration_frames: sequence.duration,
            frame_start: 1,
            frame_end: sequence.duration.saturating_mul(Frame::from(sequence.frame_rate)),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("media unreadable: {path}: {reason}")]
    UnreadableMedia { path: PathBuf, reason: String },
    #[error("host rejected strip: {0}")]
    Rejected(String),
}

/// The host's timeline, as seen by the importer.
///
/// Implementations translate these requests into whatever the host
/// application calls a strip or segment. `place_clip` failures are per-clip
/// and never abort an import.
pub trait TimelineHost {
    fn configure_timeline(&mut self, settings: &TimelineSettings);

    fn place_clip(&mut self, request: &PlacementRequest) -> Result<StripId, PlacementError>;
}

impl<T: TimelineHost + ?Sized> TimelineHost for &mut T {
    fn configure_timeline(&mut self, settings: &TimelineSettings) {
        (**self).configure_timeline(settings)
    }

    fn place_clip(&mut self, request: &PlacementRequest) -> Result<StripId, PlacementError> {
        (**self).place_clip(request)
    }
}
