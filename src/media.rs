//! Media assets: the selected video file and the playable source handed to the player

use crate::error::{ReviewError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};
use url::Url;

/// Scheme prefix used for local preview references
const PREVIEW_PREFIX: &str = "blob:video-review/";

/// Where a playable source comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    /// Local blob reference backed by the selected file
    LocalPreview,
    /// Source confirmed by the extraction service
    Confirmed,
}

/// A playable source. The player only ever reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    source_ref: Url,
    kind: MediaKind,
    duration: Option<f64>,
}

impl MediaAsset {
    /// Server-hosted copy of the same video, so the duration carries over
    pub(crate) fn confirmed(source_ref: Url, duration: Option<f64>) -> Self {
        Self {
            source_ref,
            kind: MediaKind::Confirmed,
            duration,
        }
    }

    pub fn source_ref(&self) -> &Url {
        &self.source_ref
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_local_preview(&self) -> bool {
        self.kind == MediaKind::LocalPreview
    }

    /// Length of this media in seconds, when known
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }
}

/// Table of live local preview references
///
/// Every reference handed out by `create` must be released exactly once.
/// Releasing twice, or releasing a reference this registry never issued,
/// is reported as `UnknownPreview`.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    next_id: Arc<AtomicU64>,
    live: Arc<Mutex<HashMap<String, PathBuf>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> MutexGuard<'_, HashMap<String, PathBuf>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Allocate a local preview reference for a selected file
    pub(crate) fn create(&self, video: &VideoFile) -> Result<MediaAsset> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let raw = format!("{}{}", PREVIEW_PREFIX, id);
        let source_ref = Url::parse(&raw)
            .map_err(|e| ReviewError::UnknownPreview(format!("{}: {}", raw, e)))?;

        self.live().insert(raw.clone(), video.path().to_path_buf());
        debug!("🎞️ Allocated preview {} for {}", raw, video.filename());

        Ok(MediaAsset {
            source_ref,
            kind: MediaKind::LocalPreview,
            duration: video.duration(),
        })
    }

    /// Free a local preview reference. Confirmed assets own nothing locally.
    pub(crate) fn release(&self, asset: &MediaAsset) -> Result<()> {
        if asset.kind != MediaKind::LocalPreview {
            return Ok(());
        }

        let key = asset.source_ref.as_str();
        match self.live().remove(key) {
            Some(_) => {
                debug!("♻️ Released preview {}", key);
                Ok(())
            }
            None => {
                warn!("Preview {} was already released", key);
                Err(ReviewError::UnknownPreview(key.to_string()))
            }
        }
    }

    /// Backing file of a live preview reference
    pub fn resolve(&self, source_ref: &Url) -> Option<PathBuf> {
        self.live().get(source_ref.as_str()).cloned()
    }

    /// Number of references not yet released
    pub fn live_count(&self) -> usize {
        self.live().len()
    }
}

/// A locally selected video file
#[derive(Debug, Clone)]
pub struct VideoFile {
    path: PathBuf,
    duration: Option<f64>,
}

impl VideoFile {
    /// Wrap a selected file; it must exist
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(ReviewError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Video file does not exist: {}", path.display()),
            )));
        }
        Ok(Self {
            path,
            duration: None,
        })
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    /// Fill in the duration with ffprobe
    pub async fn with_detected_duration(self) -> Self {
        let duration = detect_duration(&self.path).await;
        self.with_duration(duration)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Full filename, used as the multipart file name
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("video")
            .to_string()
    }

    /// Lowercase extension, if any
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
    }

    /// Best-effort picker filter check
    pub fn has_accepted_extension(&self, accepted: &[String]) -> bool {
        match self.extension() {
            Some(ext) => accepted.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
            None => false,
        }
    }

    /// MIME type sent with the upload
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("mp4") | Some("m4v") => "video/mp4",
            Some("webm") => "video/webm",
            Some("mov") => "video/quicktime",
            Some("mkv") => "video/x-matroska",
            Some("avi") => "video/x-msvideo",
            _ => "application/octet-stream",
        }
    }

    /// Read the whole file for upload
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Media duration in seconds via ffprobe, `None` when it cannot be determined
pub async fn detect_duration(path: &Path) -> Option<f64> {
    let output = tokio::process::Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .await;

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(_) => {
            warn!("ffprobe failed for {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("ffprobe unavailable: {}", e);
            return None;
        }
    };

    let data: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
    parse_format_duration(&data)
}

fn parse_format_duration(data: &serde_json::Value) -> Option<f64> {
    data["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}
