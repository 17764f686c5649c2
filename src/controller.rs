/// Keeps the derived views in step with the upload orchestrator
///
/// On every change notification the controller recomputes the marker list,
/// pushes source and overlay to the player, and re-checks the review
/// session against the new flashcard list. Views are never patched in place.
use crate::annotations::{Annotations, Chapter};
use crate::error::Result;
use crate::media::MediaAsset;
use crate::player::Player;
use crate::review::{ReplacementPolicy, ReviewSession};
use crate::timeline::{MarkerViewModel, TimelineMarkerBinder};
use crate::upload::{UploadOrchestrator, UploadStatus};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub struct ReviewController<P: Player> {
    player: P,
    binder: TimelineMarkerBinder,
    markers: MarkerViewModel,
    session: ReviewSession,
    policy: ReplacementPolicy,
    annotations_rx: watch::Receiver<Arc<Annotations>>,
    asset_rx: watch::Receiver<Option<MediaAsset>>,
    status_rx: watch::Receiver<UploadStatus>,
}

impl<P: Player> ReviewController<P> {
    pub fn new(uploads: &UploadOrchestrator, player: P, policy: ReplacementPolicy) -> Self {
        let binder = TimelineMarkerBinder::new(player.duration());
        let mut controller = Self {
            player,
            binder,
            markers: MarkerViewModel::default(),
            session: ReviewSession::default(),
            policy,
            annotations_rx: uploads.store().subscribe(),
            asset_rx: uploads.subscribe_asset(),
            status_rx: uploads.subscribe_status(),
        };

        let asset = controller.asset_rx.borrow_and_update().clone();
        controller.load_asset(asset.as_ref());
        let annotations = controller.annotations_rx.borrow_and_update().clone();
        controller.apply_annotations(&annotations);
        controller
    }

    /// Pull pending notifications; returns true when any view changed
    pub fn sync(&mut self) -> bool {
        let mut changed = false;

        if self.asset_rx.has_changed().unwrap_or(false) {
            let asset = self.asset_rx.borrow_and_update().clone();
            self.load_asset(asset.as_ref());
            // past-end flags depend on the new duration
            let chapters = self.annotations_rx.borrow().chapters.clone();
            self.render_markers(&chapters);
            changed = true;
        }

        if self.annotations_rx.has_changed().unwrap_or(false) {
            let annotations = self.annotations_rx.borrow_and_update().clone();
            self.apply_annotations(&annotations);
            changed = true;
        }

        if self.status_rx.has_changed().unwrap_or(false) {
            self.status_rx.borrow_and_update();
            changed = true;
        }

        changed
    }

    /// Wait for the next notification, then sync
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            res = self.annotations_rx.changed() => { if res.is_err() { return false; } }
            res = self.asset_rx.changed() => { if res.is_err() { return false; } }
            res = self.status_rx.changed() => { if res.is_err() { return false; } }
        }
        self.sync()
    }

    fn load_asset(&mut self, asset: Option<&MediaAsset>) {
        self.player.load(asset);
        self.binder.set_duration(self.player.duration());
    }

    fn render_markers(&mut self, chapters: &[Chapter]) {
        self.markers = self.binder.render(chapters);
        self.player.set_markers(self.markers.overlay());
    }

    fn apply_annotations(&mut self, annotations: &Annotations) {
        debug!(
            "Re-rendering for annotations revision {} ({} chapters)",
            annotations.revision,
            annotations.chapters.len()
        );
        self.render_markers(&annotations.chapters);
        self.session
            .replace_cards(annotations.flashcards.clone(), self.policy);
    }

    pub fn markers(&self) -> &MarkerViewModel {
        &self.markers
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn status(&self) -> UploadStatus {
        self.status_rx.borrow().clone()
    }

    /// Seek to a chapter entry; the player clamps
    pub fn seek_chapter(&mut self, index: usize) -> Option<f64> {
        let request = self.markers.select(index)?;
        Some(self.player.seek(request.time))
    }

    pub fn open_review(&mut self) -> Result<()> {
        self.session.try_open()
    }

    pub fn close_review(&mut self) {
        self.session.close();
    }

    pub fn flip(&mut self) {
        self.session.flip();
    }

    pub fn next_card(&mut self) {
        self.session.next();
    }

    pub fn prev_card(&mut self) {
        self.session.prev();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{AnnotationStore, Flashcard};
    use crate::error::{ReviewError, Result};
    use crate::extraction::{ExtractionClient, ExtractionPayload};
    use crate::media::{PreviewRegistry, VideoFile};
    use crate::player::ConsolePlayer;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct UnusedClient;

    #[async_trait]
    impl ExtractionClient for UnusedClient {
        async fn extract(&self, _video: &VideoFile) -> Result<ExtractionPayload> {
            Err(ReviewError::ExtractionFailed("unused".to_string()))
        }
    }

    fn setup(policy: ReplacementPolicy) -> (TempDir, UploadOrchestrator, ReviewController<ConsolePlayer>) {
        let dir = TempDir::new().unwrap();
        let previews = PreviewRegistry::new();
        let uploads = UploadOrchestrator::new(
            Arc::new(UnusedClient),
            AnnotationStore::new(),
            previews.clone(),
            vec!["mp4".to_string()],
        );
        let controller = ReviewController::new(&uploads, ConsolePlayer::new(previews), policy);
        (dir, uploads, controller)
    }

    fn video(dir: &TempDir, name: &str) -> VideoFile {
        let path = dir.path().join(name);
        std::fs::write(&path, b"mock").unwrap();
        VideoFile::new(path).unwrap().with_duration(Some(60.0))
    }

    fn payload(n: usize) -> ExtractionPayload {
        ExtractionPayload::new(
            vec![Chapter::new(10.0, "x"), Chapter::new(3.0, "y"), Chapter::new(75.0, "late")],
            (0..n).map(|i| Flashcard::new(format!("Q{}", i), format!("A{}", i))).collect(),
        )
    }

    #[test]
    fn test_starts_empty() {
        let (_dir, _uploads, mut controller) = setup(ReplacementPolicy::Close);
        assert!(controller.markers().is_empty());
        assert!(matches!(controller.open_review(), Err(ReviewError::EmptySession)));
        assert!(controller.player().view().source.is_none());
        assert!(!controller.sync());
    }

    #[test]
    fn test_publication_rerenders_markers_and_player() {
        let (dir, uploads, mut controller) = setup(ReplacementPolicy::Close);

        let ticket = uploads.begin(video(&dir, "a.mp4")).unwrap();
        assert!(controller.sync());
        assert!(controller.player().local_file().is_some());

        uploads.finish(ticket, Ok(payload(2)));
        assert!(controller.sync());

        let labels: Vec<&str> = controller.markers().entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["x", "y", "late"]);
        assert_eq!(controller.player().view().markers.len(), 3);
        assert!(matches!(controller.status(), UploadStatus::Ready { .. }));
    }

    #[test]
    fn test_seek_chapter_is_clamped_by_player() {
        let (dir, uploads, mut controller) = setup(ReplacementPolicy::Close);
        let ticket = uploads.begin(video(&dir, "a.mp4")).unwrap();
        uploads.finish(ticket, Ok(payload(1)));
        controller.sync();

        assert_eq!(controller.seek_chapter(1), Some(3.0));
        assert_eq!(controller.seek_chapter(2), Some(60.0));
        assert_eq!(controller.seek_chapter(9), None);
    }

    #[test]
    fn test_next_upload_rebinds_duration() {
        let (dir, uploads, mut controller) = setup(ReplacementPolicy::Close);
        let first = uploads.begin(video(&dir, "short.mp4")).unwrap();
        uploads.finish(first, Ok(payload(1)));
        controller.sync();
        assert!(!controller.markers().entries[2].within_duration);

        let long = video(&dir, "long.mp4").with_duration(Some(300.0));
        let second = uploads.begin(long).unwrap();
        controller.sync();

        // chapters of the previous upload are re-flagged against the new video
        assert_eq!(controller.player().duration(), Some(300.0));
        assert!(controller.markers().entries[2].within_duration);

        uploads.finish(second, Ok(payload(1)));
        controller.sync();
        assert!(controller.markers().entries.iter().all(|e| e.within_duration));
        assert_eq!(controller.seek_chapter(2), Some(75.0));
    }

    #[test]
    fn test_new_upload_force_closes_open_session() {
        let (dir, uploads, mut controller) = setup(ReplacementPolicy::Close);
        let first = uploads.begin(video(&dir, "a.mp4")).unwrap();
        uploads.finish(first, Ok(payload(3)));
        controller.sync();

        assert!(controller.open_review().is_ok());
        controller.prev_card();
        assert_eq!(controller.session().current_index(), 2);

        let second = uploads.begin(video(&dir, "b.mp4")).unwrap();
        uploads.finish(second, Ok(payload(1)));
        controller.sync();

        assert!(!controller.session().is_open());
        assert_eq!(controller.session().len(), 1);
    }

    #[test]
    fn test_clamp_policy_keeps_index_in_bounds() {
        let (dir, uploads, mut controller) = setup(ReplacementPolicy::Clamp);
        let first = uploads.begin(video(&dir, "a.mp4")).unwrap();
        uploads.finish(first, Ok(payload(3)));
        controller.sync();
        controller.open_review().unwrap();
        controller.prev_card();

        let second = uploads.begin(video(&dir, "b.mp4")).unwrap();
        uploads.finish(second, Ok(payload(2)));
        controller.sync();

        assert!(controller.session().is_open());
        assert_eq!(controller.session().current_index(), 1);
    }

    #[tokio::test]
    async fn test_changed_wakes_on_publication() {
        let (dir, uploads, mut controller) = setup(ReplacementPolicy::Close);
        let ticket = uploads.begin(video(&dir, "a.mp4")).unwrap();
        controller.sync();

        let publisher = uploads.clone();
        tokio::spawn(async move {
            publisher.finish(ticket, Ok(payload(2)));
        });

        assert!(controller.changed().await);
        // a second notification may still be pending for the status channel
        controller.sync();
        assert_eq!(controller.markers().len(), 3);
    }
}
