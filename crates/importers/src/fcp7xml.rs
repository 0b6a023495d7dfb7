//! Final Cut Pro XML (`xmeml`) sequence import.
//!
//! Every optional field falls back to a default instead of failing; exports
//! from different tools omit fields freely. Only a document that is not
//! well-formed XML is an error.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use media_io::NO_FILE_MARKER;
use timeline::{
    Clip, ClipKind, Frame, Sequence, Track, DEFAULT_CLIP_NAME, DEFAULT_FRAME_RATE,
    DEFAULT_HEIGHT, DEFAULT_SEQUENCE_NAME, DEFAULT_WIDTH,
};
use tracing::{debug, info};

use crate::xml::{parse_tree, Element};
use crate::ImportError;

/// Read and parse an FCP XML file.
pub fn parse_document(path: &Path) -> Result<Vec<Sequence>, ImportError> {
    let bytes = std::fs::read(path)?;
    let content = std::str::from_utf8(&bytes).map_err(|e| ImportError::MalformedDocument {
        position: e.valid_up_to() as u64,
        reason: "document is not valid UTF-8".to_string(),
    })?;
    let sequences = parse_str(content)?;
    info!(
        document = %path.display(),
        sequences = sequences.len(),
        "parsed FCP XML document"
    );
    Ok(sequences)
}

/// Parse FCP XML text. Each `sequence` element at any depth becomes one
/// independent [`Sequence`], in document order; nested sequences are not
/// flattened into their parent.
pub fn parse_str(xml: &str) -> Result<Vec<Sequence>, ImportError> {
    let root = parse_tree(xml)?;
    let file_refs = collect_file_refs(&root);

    Ok(root
        .descendants_or_self()
        .filter(|el| el.name == "sequence")
        .map(|el| parse_sequence(el, &file_refs))
        .collect())
}

/// `file id -> pathurl` for every `file` element that carries both. Later
/// uses of the same file are often written as `<file id="..."/>` alone.
fn collect_file_refs(root: &Element) -> HashMap<&str, &str> {
    let mut refs = HashMap::new();
    for file in root.descendants_or_self().filter(|el| el.name == "file") {
        if let (Some(id), Some(url)) = (file.attribute("id"), file.find_text("pathurl")) {
            refs.entry(id).or_insert(url);
        }
    }
    refs
}

/// Queries from a sequence or clip never reach into a nested sequence; that
/// sequence is parsed on its own.
const NESTED: &str = "sequence";

fn text<'a>(el: &'a Element, path: &str) -> Option<&'a str> {
    el.find_text_within(path, NESTED)
}

fn number<T: FromStr>(el: &Element, path: &str) -> Option<T> {
    text(el, path).and_then(|text| text.parse().ok())
}

fn non_negative(el: &Element, path: &str) -> Option<Frame> {
    number::<Frame>(el, path).filter(|v| *v >= 0)
}

fn parse_sequence(el: &Element, file_refs: &HashMap<&str, &str>) -> Sequence {
    let name = text(el, "name")
        .unwrap_or(DEFAULT_SEQUENCE_NAME)
        .to_string();
    let mut sequence = Sequence::new(
        name,
        number(el, ".//samplecharacteristics/width").unwrap_or(DEFAULT_WIDTH),
        number(el, ".//samplecharacteristics/height").unwrap_or(DEFAULT_HEIGHT),
        number(el, "rate/timebase").unwrap_or(DEFAULT_FRAME_RATE),
        non_negative(el, "duration").unwrap_or(0),
    );

    for track in el.select_within(".//track", NESTED) {
        sequence.add_track(parse_track(track, file_refs));
    }

    debug!(
        sequence = %sequence.name,
        tracks = sequence.tracks.len(),
        clips = sequence.clip_count(),
        "parsed sequence"
    );
    sequence
}

fn parse_track(el: &Element, file_refs: &HashMap<&str, &str>) -> Track {
    Track::new(
        el.select("clipitem")
            .into_iter()
            .map(|clip| parse_clip(clip, file_refs))
            .collect(),
    )
}

fn parse_clip(el: &Element, file_refs: &HashMap<&str, &str>) -> Clip {
    let kind = if el.find_within(".//media/video", NESTED).is_some() {
        ClipKind::Video
    } else {
        ClipKind::Audio
    };

    let mut clip = Clip::new(kind, number(el, "start").unwrap_or(0));
    if let Some(end) = number(el, "end") {
        clip.timeline_end = end;
    }
    clip.source_in = number(el, "in").unwrap_or(0);
    clip.source_out = number(el, "out").unwrap_or(clip.timeline_end);
    clip.name = text(el, "name").unwrap_or(DEFAULT_CLIP_NAME).to_string();
    clip.raw_file_path = clip_file_path(el, file_refs);
    clip
}

fn clip_file_path(el: &Element, file_refs: &HashMap<&str, &str>) -> String {
    if let Some(url) = text(el, ".//file/pathurl") {
        return url.to_string();
    }
    el.select_within(".//file", NESTED)
        .into_iter()
        .filter_map(|file| file.attribute("id"))
        .find_map(|id| file_refs.get(id))
        .map_or_else(|| NO_FILE_MARKER.to_string(), |url| (*url).to_string())
}
