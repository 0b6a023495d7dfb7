use serde::Serialize;
use timeline::{ClipKind, PlacementError, PlacementRequest, StripId, TimelineHost, TimelineSettings};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize)]
pub struct StripRecord {
    pub id: StripId,
    #[serde(flatten)]
    pub request: PlacementRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneRecord {
    #[serde(flatten)]
    pub settings: TimelineSettings,
    pub strips: Vec<StripRecord>,
}

/// Host adapter that records the timeline it is asked to build, for JSON
/// output. With probing on, every file is checked with ffprobe first and
/// rejected when unreadable or lacking the stream its clip needs.
#[derive(Debug, Default)]
pub struct JsonTimelineHost {
    scenes: Vec<SceneRecord>,
    current: Option<usize>,
    probe: bool,
}

impl JsonTimelineHost {
    pub fn new(probe: bool) -> Self {
        Self {
            probe,
            ..Self::default()
        }
    }

    pub fn scenes(&self) -> &[SceneRecord] {
        &self.scenes
    }

    fn check_media(&self, request: &PlacementRequest) -> Result<(), PlacementError> {
        if !self.probe {
            return Ok(());
        }
        let info = media_io::probe_media(&request.source_path).map_err(|e| {
            PlacementError::UnreadableMedia {
                path: request.source_path.clone(),
                reason: e.to_string(),
            }
        })?;
        match request.kind {
            ClipKind::Video if !info.has_video => Err(PlacementError::Rejected(format!(
                "{} has no video stream",
                request.source_path.display()
            ))),
            ClipKind::Audio if !info.has_audio && !info.has_video => {
                Err(PlacementError::Rejected(format!(
                    "{} has no audio stream",
                    request.source_path.display()
                )))
            }
            _ => Ok(()),
        }
    }
}

impl TimelineHost for JsonTimelineHost {
    fn configure_timeline(&mut self, settings: &TimelineSettings) {
        // Re-configuring a sequence selects its scene again.
        if let Some(idx) = self
            .scenes
            .iter()
            .position(|s| s.settings.sequence_index == settings.sequence_index)
        {
            self.scenes[idx].settings = settings.clone();
            self.current = Some(idx);
            return;
        }
        self.scenes.push(SceneRecord {
            settings: settings.clone(),
            strips: Vec::new(),
        });
        self.current = Some(self.scenes.len() - 1);
    }

    fn place_clip(&mut self, request: &PlacementRequest) -> Result<StripId, PlacementError> {
        let Some(idx) = self.current else {
            return Err(PlacementError::Rejected(
                "no timeline configured".to_string(),
            ));
        };
        self.check_media(request)?;
        if request.is_degenerate() {
            warn!(clip = %request.name, duration = request.final_duration, "placing zero-length strip");
        }

        let id = StripId::new();
        debug!(clip = %request.name, %id, channel = request.channel, "strip recorded");
        if let Some(scene) = self.scenes.get_mut(idx) {
            scene.strips.push(StripRecord {
                id,
                request: request.clone(),
            });
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(sequence_index: usize, name: &str) -> TimelineSettings {
        TimelineSettings {
            sequence_index,
            name: name.to_string(),
            width: 1920,
            height: 1080,
            fps: 30,
            duration_frames: 10,
            frame_start: 1,
            frame_end: 300,
        }
    }

    fn request(name: &str) -> PlacementRequest {
        PlacementRequest {
            kind: ClipKind::Video,
            name: name.to_string(),
            source_path: PathBuf::from("/media/a.mov"),
            channel: 2,
            start: 0,
            offset_start: 0,
            final_end: 10,
            final_duration: 10,
        }
    }

    #[test]
    fn test_place_before_configure_is_rejected() {
        let mut host = JsonTimelineHost::new(false);
        assert!(host.place_clip(&request("A")).is_err());
    }

    #[test]
    fn test_reconfigure_selects_existing_scene() {
        let mut host = JsonTimelineHost::new(false);
        host.configure_timeline(&settings(0, "One"));
        host.place_clip(&request("A")).unwrap();
        host.configure_timeline(&settings(1, "Two"));
        host.place_clip(&request("B")).unwrap();
        host.configure_timeline(&settings(0, "One"));
        host.place_clip(&request("C")).unwrap();

        assert_eq!(host.scenes().len(), 2);
        let first: Vec<&str> = host.scenes()[0]
            .strips
            .iter()
            .map(|s| s.request.name.as_str())
            .collect();
        assert_eq!(first, vec!["A", "C"]);
    }

    #[test]
    fn test_identical_settings_keep_separate_scenes() {
        let mut host = JsonTimelineHost::new(false);
        host.configure_timeline(&settings(0, "Unnamed Sequence"));
        host.place_clip(&request("A")).unwrap();
        host.configure_timeline(&settings(1, "Unnamed Sequence"));
        host.place_clip(&request("B")).unwrap();

        assert_eq!(host.scenes().len(), 2);
        assert_eq!(host.scenes()[0].strips.len(), 1);
        assert_eq!(host.scenes()[1].strips[0].request.name, "B");
    }
}
