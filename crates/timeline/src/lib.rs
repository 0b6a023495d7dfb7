use serde::{Deserialize, Serialize};

mod host;
pub use host::*;
mod placement;
pub use placement::*;

pub type Frame = i64; // time in frames, negatives allowed for pre-roll offsets

pub const DEFAULT_SEQUENCE_NAME: &str = "Unnamed Sequence";
pub const DEFAULT_CLIP_NAME: &str = "Unnamed Clip";
pub const DEFAULT_FRAME_RATE: u32 = 30;
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
/// Length given to a clip whose document carries no `end` at all.
pub const DEFAULT_CLIP_LENGTH: Frame = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipKind {
    Video,
    Audio,
}

impl ClipKind {
    /// Host channel a clip of this kind lands on. Fixed for the whole import,
    /// independent of which track the clip came from.
    pub const fn channel(self) -> u32 {
        match self {
            ClipKind::Video => 2,
            ClipKind::Audio => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    pub kind: ClipKind,
    pub name: String,
    pub timeline_start: Frame,
    pub timeline_end: Frame,
    pub source_in: Frame,
    pub source_out: Frame,
    /// Path text exactly as recorded in the document.
    pub raw_file_path: String,
}

impl Clip {
    /// Clip with documented defaults for everything except kind and start.
    pub fn new(kind: ClipKind, timeline_start: Frame) -> Self {
        let timeline_end = timeline_start.saturating_add(DEFAULT_CLIP_LENGTH);
        Self {
            kind,
            name: DEFAULT_CLIP_NAME.to_string(),
            timeline_start,
            timeline_end,
            source_in: 0,
            source_out: timeline_end,
            raw_file_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self { clips }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub duration: Frame,
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub tracks: Vec<Track>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            name: DEFAULT_SEQUENCE_NAME.to_string(),
            duration: 0,
            frame_rate: DEFAULT_FRAME_RATE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tracks: Vec::new(),
        }
    }
}

impl Sequence {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        frame_rate: u32,
        duration: Frame,
    ) -> Self {
        Self {
            name: name.into(),
            duration,
            frame_rate,
            width,
            height,
            tracks: Vec::new(),
        }
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }
}
