//! Helpers for the path text found in `file/pathurl` elements.
//!
//! Exports from different machines record media as `file://localhost/...`
//! URLs, bare absolute paths, Windows paths or paths relative to the project.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file:";

/// Turn recorded path text into a filesystem path.
///
/// URL forms are stripped of their scheme/host and percent-decoded; relative
/// paths are joined onto `base_dir`. Returns `None` for text that cannot name
/// a file (empty, NUL bytes, invalid UTF-8 after decoding).
pub fn normalize_recorded_path(raw: &str, base_dir: &Path) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('\0') {
        return None;
    }

    let text = if is_file_url(raw) {
        decode_file_url(raw)?
    } else {
        raw.to_string()
    };
    if text.is_empty() || text.contains('\0') {
        return None;
    }

    let path = PathBuf::from(&text);
    if path.is_absolute() || looks_like_windows_absolute(&text) {
        Some(path)
    } else {
        Some(base_dir.join(path))
    }
}

/// Filename component of recorded path text, splitting on both separators.
pub fn basename(path: &str) -> &str {
    path.rsplit(&['/', '\\'][..]).next().unwrap_or(path)
}

/// Case-folded form used as the index key.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Split a folded basename into `(stem, extension)`. Dotfiles keep their
/// leading dot in the stem.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Video,
    Audio,
    Image,
}

/// Media class of a folded extension, `None` when unknown.
pub fn media_class(ext: &str) -> Option<MediaClass> {
    match ext {
        "mov" | "mp4" | "m4v" | "mxf" | "avi" | "mkv" | "webm" | "mts" | "m2ts" | "dv"
        | "mpg" | "mpeg" | "r3d" | "braw" => Some(MediaClass::Video),
        "wav" | "aif" | "aiff" | "mp3" | "m4a" | "aac" | "flac" | "ogg" | "caf" => {
            Some(MediaClass::Audio)
        }
        "png" | "jpg" | "jpeg" | "tif" | "tiff" | "dpx" | "exr" | "psd" | "gif" | "bmp" => {
            Some(MediaClass::Image)
        }
        _ => None,
    }
}

fn is_file_url(raw: &str) -> bool {
    raw.len() >= FILE_SCHEME.len()
        && raw
            .get(..FILE_SCHEME.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(FILE_SCHEME))
}

fn decode_file_url(raw: &str) -> Option<String> {
    let rest = raw.get(FILE_SCHEME.len()..)?;
    let rest = match rest.strip_prefix("//") {
        Some(authority_and_path) => {
            // Drop the host ("localhost" or empty); keep the leading slash.
            match authority_and_path.find('/') {
                Some(idx) => &authority_and_path[idx..],
                None => return None,
            }
        }
        None => rest,
    };

    let decoded = percent_decode_str(rest).decode_utf8().ok()?.into_owned();

    // file:///C:/Media/clip.mov -> C:/Media/clip.mov
    let bytes = decoded.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' && bytes[1].is_ascii_alphabetic()
    {
        return Some(decoded[1..].to_string());
    }
    Some(decoded)
}

fn looks_like_windows_absolute(text: &str) -> bool {
    let bytes = text.as_bytes();
    (bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/'))
        || text.starts_with("\\\\")
}
