use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

pub mod path_index;
pub mod pathurl;
pub mod resolver;

pub use path_index::{IndexBuildWarning, PathIndex};
pub use resolver::{MatchStrategy, MediaResolver, Resolution, ResolverOptions, NO_FILE_MARKER};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe not found on PATH; please install FFmpeg (ffprobe)")]
    FfprobeMissing,
    #[error("ffprobe failed: {0}")]
    FfprobeFailed(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no audio or video streams in {0}")]
    NoStreams(PathBuf),
}

#[derive(Debug, Clone, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FfprobeJson {
    streams: Option<Vec<FfprobeStream>>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub has_video: bool,
    pub has_audio: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<(u32, u32)>,
    pub duration_seconds: Option<f64>,
}

fn parse_rate(s: &str) -> Option<(u32, u32)> {
    let s = s.trim();
    if s == "0/0" || s == "0" || s.is_empty() {
        return None;
    }
    if let Some((a, b)) = s.split_once('/') {
        let num = a.parse().ok()?;
        let den = b.parse().ok()?;
        if den == 0 {
            return None;
        }
        return Some((num, den));
    }
    // integer fallback
    let v: u32 = s.parse().ok()?;
    Some((v, 1))
}

fn parse_probe_output(path: &Path, stdout: &[u8]) -> Result<MediaInfo, ProbeError> {
    let parsed: FfprobeJson =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Parse(e.to_string()))?;

    let mut info = MediaInfo {
        path: path.to_path_buf(),
        has_video: false,
        has_audio: false,
        width: None,
        height: None,
        fps: None,
        duration_seconds: None,
    };

    for s in parsed.streams.iter().flatten() {
        match s.codec_type.as_deref() {
            Some("video") => {
                info.has_video = true;
                info.width = info.width.or(s.width);
                info.height = info.height.or(s.height);
                info.fps = info
                    .fps
                    .or_else(|| s.avg_frame_rate.as_deref().and_then(parse_rate))
                    .or_else(|| s.r_frame_rate.as_deref().and_then(parse_rate));
            }
            Some("audio") => info.has_audio = true,
            _ => {}
        }
    }

    if !info.has_video && !info.has_audio {
        return Err(ProbeError::NoStreams(path.to_path_buf()));
    }

    info.duration_seconds = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse().ok());

    Ok(info)
}

pub fn ffprobe_available() -> bool {
    which::which("ffprobe").is_ok()
}

/// Run ffprobe on `path`. Fails when ffprobe is unavailable, rejects the
/// file, or finds no audio/video streams.
pub fn probe_media(path: &Path) -> Result<MediaInfo, ProbeError> {
    let ffprobe = which::which("ffprobe").map_err(|_| ProbeError::FfprobeMissing)?;
    let out = Command::new(ffprobe)
        .arg("-v")
        .arg("error")
        .arg("-show_format")
        .arg("-show_streams")
        .arg("-print_format")
        .arg("json")
        .arg(path)
        .output()
        .map_err(|e| ProbeError::FfprobeFailed(e.to_string()))?;
    if !out.status.success() {
        return Err(ProbeError::FfprobeFailed(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ));
    }
    parse_probe_output(path, &out.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30000/1001"), Some((30000, 1001)));
        assert_eq!(parse_rate("25"), Some((25, 1)));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("24/0"), None);
    }

    #[test]
    fn test_probe_output_with_video_and_audio() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080, "avg_frame_rate": "24/1"},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "12.5"}
        }"#;
        let info = parse_probe_output(Path::new("/m/a.mov"), json).unwrap();
        assert!(info.has_video);
        assert!(info.has_audio);
        assert_eq!(info.width, Some(1920));
        assert_eq!(info.fps, Some((24, 1)));
        assert_eq!(info.duration_seconds, Some(12.5));
    }

    #[test]
    fn test_probe_output_without_streams_is_rejected() {
        let json = br#"{"streams": [{"codec_type": "data"}], "format": {}}"#;
        let err = parse_probe_output(Path::new("/m/a.bin"), json).unwrap_err();
        assert!(matches!(err, ProbeError::NoStreams(_)));
    }
}
