/// End-to-end import tests: parse a document on disk, resolve media against
/// real directory trees and place clips on a recording host.
use importers::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use timeline::{
    ClipKind, PlacementError, PlacementRequest, StripId, TimelineHost, TimelineSettings,
};

#[derive(Default)]
struct RecordingHost {
    configured: Vec<TimelineSettings>,
    placed: Vec<PlacementRequest>,
    reject_containing: Option<&'static str>,
}

impl TimelineHost for RecordingHost {
    fn configure_timeline(&mut self, settings: &TimelineSettings) {
        self.configured.push(settings.clone());
    }

    fn place_clip(&mut self, request: &PlacementRequest) -> Result<StripId, PlacementError> {
        if let Some(needle) = self.reject_containing {
            if request.source_path.to_string_lossy().contains(needle) {
                return Err(PlacementError::UnreadableMedia {
                    path: request.source_path.clone(),
                    reason: "corrupt header".to_string(),
                });
            }
        }
        self.placed.push(request.clone());
        Ok(StripId::new())
    }
}

fn touch(dir: &Path, rel: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"media").unwrap();
    path
}

fn clipitem(name: &str, start: i64, end: i64, src_in: i64, src_out: i64, path: &str, video: bool) -> String {
    let media = if video { "<media><video/></media>" } else { "<media><audio/></media>" };
    format!(
        "<clipitem><name>{name}</name><start>{start}</start><end>{end}</end>\
         <in>{src_in}</in><out>{src_out}</out>\
         <file><pathurl>{path}</pathurl>{media}</file></clipitem>"
    )
}

fn write_project(dir: &Path, body: &str) -> PathBuf {
    let doc = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE xmeml>
<xmeml version="5">{body}</xmeml>"#
    );
    let path = dir.join("project.xml");
    fs::write(&path, doc).unwrap();
    path
}

fn sequence(name: &str, tracks: &[Vec<String>]) -> String {
    let tracks: String = tracks
        .iter()
        .map(|clips| format!("<track>{}</track>", clips.concat()))
        .collect();
    format!(
        "<sequence><name>{name}</name><duration>20</duration>\
         <rate><timebase>24</timebase></rate><media>{tracks}</media></sequence>"
    )
}

#[test]
fn test_places_resolved_clips_with_derived_geometry() {
    let project = TempDir::new().unwrap();
    touch(project.path(), "footage/interview.mov");
    touch(project.path(), "audio/music.wav");

    let body = sequence(
        "Main",
        &[
            vec![clipitem("Interview", 500, 600, 10, 110, "footage/interview.mov", true)],
            vec![clipitem("Music", 0, 480, 0, 480, "file://localhost/old/drive/music.wav", false)],
        ],
    );
    let doc = write_project(project.path(), &body);

    let mut host = RecordingHost::default();
    let outcome = import_document(&doc, &[] as &[PathBuf], &mut host).unwrap();

    assert_eq!(outcome.placed, 2);
    assert!(outcome.missing.is_empty());

    assert_eq!(host.configured.len(), 1);
    assert_eq!(host.configured[0].fps, 24);
    assert_eq!(host.configured[0].frame_end, 480);

    let video = &host.placed[0];
    assert_eq!(video.kind, ClipKind::Video);
    assert_eq!(video.channel, 2);
    assert_eq!(
        (video.start, video.offset_start, video.final_end, video.final_duration),
        (490, 500, 600, 100)
    );
    assert!(video.source_path.ends_with("footage/interview.mov"));

    let audio = &host.placed[1];
    assert_eq!(audio.kind, ClipKind::Audio);
    assert_eq!(audio.channel, 1);
    assert!(audio.source_path.ends_with("music.wav"));
}

#[test]
fn test_missing_media_is_collected_not_fatal() {
    let project = TempDir::new().unwrap();
    touch(project.path(), "present.mov");

    let body = sequence(
        "Main",
        &[vec![
            clipitem("A", 0, 10, 0, 10, "missing.mov", true),
            clipitem("B", 10, 20, 0, 10, "present.mov", true),
            clipitem("C", 20, 30, 0, 10, "missing.mov", true),
            "<clipitem><name>No file</name></clipitem>".to_string(),
        ]],
    );
    let doc = write_project(project.path(), &body);

    let mut host = RecordingHost::default();
    let outcome = import_document(&doc, &[] as &[PathBuf], &mut host).unwrap();

    assert_eq!(outcome.placed, 1);
    assert_eq!(outcome.missing.len(), 2);
    let entry = outcome.missing.get("missing.mov").unwrap();
    assert_eq!(entry.clips, vec!["A", "C"]);
    assert_eq!(entry.reason, MissingReason::Unresolved);
    assert!(outcome.missing.get("None").is_some());
}

#[test]
fn test_retry_with_search_dir_places_only_previous_misses() {
    let project = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    touch(project.path(), "here.mov");

    let body = sequence(
        "Main",
        &[vec![
            clipitem("Here", 0, 10, 0, 10, "here.mov", true),
            clipitem("Moved", 10, 20, 0, 10, "/old/volume/moved.mov", true),
        ]],
    ) + &sequence("Second", &[vec![clipitem("Other", 0, 5, 0, 5, "here.mov", false)]]);
    let doc = write_project(project.path(), &body);

    let mut host = RecordingHost::default();
    let mut session = ImportSession::open(&doc, &ImportConfig::default()).unwrap();
    let first = session.run(&mut host);
    assert_eq!(first.placed, 2);
    assert_eq!(first.missing.raw_paths().collect::<Vec<_>>(), vec!["/old/volume/moved.mov"]);
    assert_eq!(host.configured.len(), 2);

    touch(elsewhere.path(), "nested/MOVED.mov");
    let second = session.retry_with(&[elsewhere.path()], &mut host);
    assert_eq!(second.placed, 1);
    assert!(second.missing.is_empty());
    assert!(session.is_complete());
    assert_eq!(session.placed_total(), 3);

    // Only the sequence that still had work is configured again.
    assert_eq!(host.configured.len(), 3);
    let names: Vec<&str> = host.placed.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Here", "Other", "Moved"]);
}

#[test]
fn test_extra_dirs_up_front() {
    let project = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    touch(library.path(), "A_clip_A_final.mov");

    let body = sequence("Main", &[vec![clipitem("A", 0, 10, 0, 10, "footage/clip_A.mov", true)]]);
    let doc = write_project(project.path(), &body);

    let mut host = RecordingHost::default();
    let outcome = import_document(&doc, &[library.path()], &mut host).unwrap();
    assert_eq!(outcome.placed, 1);
    assert!(host.placed[0].source_path.ends_with("A_clip_A_final.mov"));
}

#[test]
fn test_placement_errors_are_reported_with_misses() {
    let project = TempDir::new().unwrap();
    touch(project.path(), "broken.mov");
    touch(project.path(), "fine.mov");

    let body = sequence(
        "Main",
        &[vec![
            clipitem("Broken", 0, 10, 0, 10, "broken.mov", true),
            clipitem("Fine", 10, 20, 0, 10, "fine.mov", true),
        ]],
    );
    let doc = write_project(project.path(), &body);

    let mut host = RecordingHost {
        reject_containing: Some("broken"),
        ..RecordingHost::default()
    };
    let outcome = import_document(&doc, &[] as &[PathBuf], &mut host).unwrap();
    assert_eq!(outcome.placed, 1);
    let entry = outcome.missing.get("broken.mov").unwrap();
    assert!(matches!(entry.reason, MissingReason::Rejected { .. }));
}

#[test]
fn test_inverted_trim_is_placed_as_degenerate_strip() {
    let project = TempDir::new().unwrap();
    touch(project.path(), "a.mov");
    let body = sequence("Main", &[vec![clipitem("Backwards", 100, 50, 80, 20, "a.mov", true)]]);
    let doc = write_project(project.path(), &body);

    let mut host = RecordingHost::default();
    let outcome = import_document(&doc, &[] as &[PathBuf], &mut host).unwrap();
    assert_eq!(outcome.placed, 1);
    assert_eq!(host.placed[0].final_duration, -60);
}

#[test]
fn test_malformed_document_aborts_before_any_host_call() {
    let project = TempDir::new().unwrap();
    let doc = project.path().join("broken.xml");
    fs::write(&doc, "<xmeml><sequence><name>Oops</sequence>").unwrap();

    let mut host = RecordingHost::default();
    let err = import_document(&doc, &[] as &[PathBuf], &mut host).unwrap_err();
    assert!(matches!(err, ImportError::MalformedDocument { .. }));
    assert!(host.configured.is_empty());
    assert!(host.placed.is_empty());
}

#[test]
fn test_missing_document_is_io_error() {
    let project = TempDir::new().unwrap();
    let mut host = RecordingHost::default();
    let err = import_document(&project.path().join("nope.xml"), &[] as &[PathBuf], &mut host)
        .unwrap_err();
    assert!(matches!(err, ImportError::Io(_)));
}

#[test]
fn test_repeated_sessions_resolve_identically() {
    let project = TempDir::new().unwrap();
    touch(project.path(), "a/take_1_v1.mov");
    touch(project.path(), "b/take_1_v2.mov");
    let body = sequence("Main", &[vec![clipitem("T", 0, 10, 0, 10, "take_1.mov", true)]]);
    let doc = write_project(project.path(), &body);

    let mut first = RecordingHost::default();
    let mut second = RecordingHost::default();
    import_document(&doc, &[] as &[PathBuf], &mut first).unwrap();
    import_document(&doc, &[] as &[PathBuf], &mut second).unwrap();
    assert_eq!(first.placed, second.placed);
    assert!(first.placed[0].source_path.ends_with("a/take_1_v1.mov"));
}

#[test]
fn test_nested_sequence_clips_are_placed_once() {
    let project = TempDir::new().unwrap();
    touch(project.path(), "leaf.mov");
    let inner = sequence("Inner", &[vec![clipitem("Leaf", 0, 10, 0, 10, "leaf.mov", true)]]);
    let body = sequence(
        "Outer",
        &[vec![format!("<clipitem><name>Nest</name>{inner}</clipitem>")]],
    );
    let doc = write_project(project.path(), &body);

    let mut host = RecordingHost::default();
    let outcome = import_document(&doc, &[] as &[PathBuf], &mut host).unwrap();

    let names: Vec<&str> = host.configured.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Outer", "Inner"]);
    let placed: Vec<&str> = host.placed.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(placed, vec!["Leaf"]);
    assert_eq!(outcome.placed, 1);
    // The nesting clip itself carries no media.
    assert_eq!(outcome.missing.get("None").unwrap().clips, vec!["Nest"]);
}
