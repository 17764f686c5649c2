//! Playback collaborator: receives a source and markers, seeks on request

use crate::annotations::Chapter;
use crate::media::{MediaAsset, PreviewRegistry};
use crate::timeline::format_timestamp;
use std::path::PathBuf;
use tracing::{debug, info};

/// What the player is asked to render
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub source: Option<MediaAsset>,
    pub markers: Vec<Chapter>,
}

/// Rendering/decoding is out of scope; implementors own controls and seeking
pub trait Player: Send {
    /// Show a new source (or none), taking on its duration
    fn load(&mut self, source: Option<&MediaAsset>);

    /// Replace the native marker overlay
    fn set_markers(&mut self, markers: Vec<Chapter>);

    /// Seek, clamping into the playable range; returns the new position
    fn seek(&mut self, time: f64) -> f64;

    /// Current playback position in seconds
    fn position(&self) -> f64;

    /// Duration of the loaded source, when known
    fn duration(&self) -> Option<f64>;
}

/// Clamp a seek target to `[0, duration]`
pub fn clamp_seek(time: f64, duration: Option<f64>) -> f64 {
    let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
    match duration {
        Some(d) => time.min(d),
        None => time,
    }
}

/// Terminal stand-in for the video element
pub struct ConsolePlayer {
    previews: PreviewRegistry,
    view: PlayerView,
    duration: Option<f64>,
    position: f64,
}

impl ConsolePlayer {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            previews,
            view: PlayerView {
                source: None,
                markers: Vec::new(),
            },
            duration: None,
            position: 0.0,
        }
    }

    pub fn view(&self) -> &PlayerView {
        &self.view
    }

    /// File backing the current source, for local previews
    pub fn local_file(&self) -> Option<PathBuf> {
        let source = self.view.source.as_ref()?;
        self.previews.resolve(source.source_ref())
    }
}

impl Player for ConsolePlayer {
    fn load(&mut self, source: Option<&MediaAsset>) {
        // a confirmed source is the same video as the preview it replaces
        let same_video = matches!(
            (self.view.source.as_ref(), source),
            (Some(previous), Some(next)) if previous.is_local_preview() && !next.is_local_preview()
        );

        self.view.source = source.cloned();
        self.duration = source.and_then(MediaAsset::duration);
        self.position = if same_video {
            clamp_seek(self.position, self.duration)
        } else {
            0.0
        };

        match source {
            Some(asset) => info!("▶️ Player source: {} ({:?})", asset.source_ref(), asset.kind()),
            None => info!("⏹️ Player source cleared"),
        }
    }

    fn set_markers(&mut self, markers: Vec<Chapter>) {
        debug!("Player overlay now has {} markers", markers.len());
        self.view.markers = markers;
    }

    fn seek(&mut self, time: f64) -> f64 {
        self.position = clamp_seek(time, self.duration);
        info!("⏩ Seek to {}", format_timestamp(self.position));
        self.position
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}
