/// Upload orchestration: optimistic local preview, background extraction,
/// and publication of the latest result only
///
/// Each submission gets a sequence number. A response is applied only when
/// its sequence is still the latest; anything older is dropped without side
/// effects. The orchestrator is the sole writer of the annotation store and
/// the sole creator/releaser of media assets.
use crate::annotations::{AnnotationStore, Annotations};
use crate::error::{ReviewError, Result};
use crate::extraction::{ExtractionClient, ExtractionPayload};
use crate::media::{MediaAsset, PreviewRegistry, VideoFile};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Failure indicator shown next to the chapter and flashcard panels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UploadStatus {
    Idle,
    Uploading { sequence: u64, file_name: String },
    Ready { sequence: u64, chapters: usize, flashcards: usize },
    Failed { sequence: u64, reason: String },
}

impl UploadStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, UploadStatus::Failed { .. })
    }
}

/// Result of finishing one submission
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Annotations were replaced with this submission's payload
    Published(Arc<Annotations>),
    /// Extraction failed; previous annotations retained
    Failed(String),
    /// A newer submission exists; this result was dropped
    Discarded { sequence: u64, latest: u64 },
}

/// An in-flight submission
#[derive(Debug)]
pub struct UploadTicket {
    sequence: u64,
    video: VideoFile,
}

impl UploadTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn video(&self) -> &VideoFile {
        &self.video
    }
}

#[derive(Debug, Default)]
struct Tracking {
    latest: u64,
    current: Option<MediaAsset>,
}

struct Inner {
    client: Arc<dyn ExtractionClient>,
    store: AnnotationStore,
    previews: PreviewRegistry,
    accepted_extensions: Vec<String>,
    tracking: Mutex<Tracking>,
    asset_tx: watch::Sender<Option<MediaAsset>>,
    status_tx: watch::Sender<UploadStatus>,
}

impl Inner {
    fn tracking(&self) -> MutexGuard<'_, Tracking> {
        self.tracking.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish `next` and release whatever it supersedes, in that order
    fn swap_asset(&self, tracking: &mut Tracking, next: Option<MediaAsset>) {
        let previous = std::mem::replace(&mut tracking.current, next.clone());
        self.asset_tx.send_replace(next);

        if let Some(old) = previous {
            if let Err(e) = self.previews.release(&old) {
                warn!("Failed to release superseded asset: {}", e);
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let current = self.tracking().current.take();
        if let Some(asset) = current {
            if let Err(e) = self.previews.release(&asset) {
                warn!("Failed to release asset on teardown: {}", e);
            }
        }
    }
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    inner: Arc<Inner>,
}

impl UploadOrchestrator {
    pub fn new(
        client: Arc<dyn ExtractionClient>,
        store: AnnotationStore,
        previews: PreviewRegistry,
        accepted_extensions: Vec<String>,
    ) -> Self {
        let (asset_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(UploadStatus::Idle);

        Self {
            inner: Arc::new(Inner {
                client,
                store,
                previews,
                accepted_extensions,
                tracking: Mutex::new(Tracking::default()),
                asset_tx,
                status_tx,
            }),
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.inner.store
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.inner.previews
    }

    pub fn current_asset(&self) -> Option<MediaAsset> {
        self.inner.tracking().current.clone()
    }

    pub fn latest_sequence(&self) -> u64 {
        self.inner.tracking().latest
    }

    pub fn status(&self) -> UploadStatus {
        self.inner.status_tx.borrow().clone()
    }

    pub fn subscribe_asset(&self) -> watch::Receiver<Option<MediaAsset>> {
        self.inner.asset_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<UploadStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Start a submission: publish the local preview immediately and
    /// supersede any earlier submission
    pub fn begin(&self, video: VideoFile) -> Result<UploadTicket> {
        if !video.has_accepted_extension(&self.inner.accepted_extensions) {
            warn!(
                "⚠️ {} is not one of [{}]; uploading anyway",
                video.filename(),
                self.inner.accepted_extensions.join(", ")
            );
        }

        let preview = self.inner.previews.create(&video)?;

        let mut tracking = self.inner.tracking();
        tracking.latest += 1;
        let sequence = tracking.latest;
        self.inner.swap_asset(&mut tracking, Some(preview));
        self.inner.status_tx.send_replace(UploadStatus::Uploading {
            sequence,
            file_name: video.filename(),
        });
        drop(tracking);

        info!("📤 Upload #{} started: {}", sequence, video.filename());
        Ok(UploadTicket { sequence, video })
    }

    /// Apply an extraction result if its submission is still the latest
    pub fn finish(&self, ticket: UploadTicket, result: Result<ExtractionPayload>) -> UploadOutcome {
        let mut tracking = self.inner.tracking();
        let latest = tracking.latest;

        if ticket.sequence != latest {
            let stale = ReviewError::StaleResponse {
                sequence: ticket.sequence,
                latest,
            };
            debug!("{}", stale);
            return UploadOutcome::Discarded {
                sequence: ticket.sequence,
                latest,
            };
        }

        match result {
            Ok(payload) => {
                let published = self.inner.store.replace(
                    payload.chapters,
                    payload.flashcards,
                    ticket.sequence,
                );

                if let Some(source) = payload.source {
                    info!("🔗 Upload #{} confirmed source {}", ticket.sequence, source);
                    let duration = tracking.current.as_ref().and_then(MediaAsset::duration);
                    self.inner.swap_asset(
                        &mut tracking,
                        Some(MediaAsset::confirmed(source, duration)),
                    );
                }

                self.inner.status_tx.send_replace(UploadStatus::Ready {
                    sequence: ticket.sequence,
                    chapters: published.chapters.len(),
                    flashcards: published.flashcards.len(),
                });
                info!(
                    "✅ Upload #{} published {} chapters, {} flashcards",
                    ticket.sequence,
                    published.chapters.len(),
                    published.flashcards.len()
                );
                UploadOutcome::Published(published)
            }
            Err(e) => {
                let cause = match e {
                    ReviewError::ExtractionFailed(cause) => cause,
                    other => other.to_string(),
                };
                let reason = ReviewError::ExtractionFailed(cause).to_string();
                warn!("❌ Upload #{}: {}", ticket.sequence, reason);
                self.inner.status_tx.send_replace(UploadStatus::Failed {
                    sequence: ticket.sequence,
                    reason: reason.clone(),
                });
                UploadOutcome::Failed(reason)
            }
        }
    }

    /// Begin, await extraction, finish
    pub async fn submit(&self, video: VideoFile) -> Result<UploadOutcome> {
        let ticket = self.begin(video)?;
        let result = self.inner.client.extract(ticket.video()).await;
        Ok(self.finish(ticket, result))
    }

    /// Like `submit`, but the preview is published before this returns and
    /// extraction continues in the background
    pub fn spawn_submit(&self, video: VideoFile) -> Result<JoinHandle<UploadOutcome>> {
        let ticket = self.begin(video)?;
        let this = self.clone();

        Ok(tokio::spawn(async move {
            let result = this.inner.client.extract(ticket.video()).await;
            this.finish(ticket, result)
        }))
    }

    /// Tear down: release the current asset and ignore any in-flight result
    pub fn shutdown(&self) {
        let mut tracking = self.inner.tracking();
        tracking.latest += 1;
        self.inner.swap_asset(&mut tracking, None);
        self.inner.status_tx.send_replace(UploadStatus::Idle);
        debug!("Upload orchestrator shut down");
    }
}
