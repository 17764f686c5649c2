/// Video Review - chapter timeline and flashcard review controller
///
/// A selected video is published as a local preview right away, uploaded to
/// an extraction service in the background, and the returned chapters and
/// flashcards drive a seekable marker timeline and a cyclic review session.

pub mod error;
pub mod config;
pub mod media;
pub mod annotations;
pub mod timeline;
pub mod review;
pub mod extraction;
pub mod upload;
pub mod player;
pub mod controller;

// Re-export main types for easy access
pub use crate::error::{ReviewError, Result};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::media::{MediaAsset, MediaKind, PreviewRegistry, VideoFile};
pub use crate::annotations::{AnnotationStore, Annotations, Chapter, Flashcard};
pub use crate::timeline::{MarkerEntry, MarkerViewModel, SeekRequest, TimelineMarkerBinder};
pub use crate::review::{CardFace, Progress, ReplacementPolicy, ReviewSession, ReviewState};
pub use crate::extraction::{ExtractionClient, ExtractionPayload, HttpExtractionClient};
pub use crate::upload::{UploadOrchestrator, UploadOutcome, UploadStatus, UploadTicket};
pub use crate::player::{ConsolePlayer, Player};
pub use crate::controller::ReviewController;
