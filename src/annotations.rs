/// Chapters and flashcards produced by the extraction service
///
/// The store is replaced wholesale on each successful extraction and never
/// partially updated. Readers get immutable snapshots and a change
/// notification through a watch channel.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// A time-labeled seek point on the media timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    /// Offset from the start of the video in seconds
    pub time: f64,
    /// Display label; not unique, never used as an identity key
    pub label: String,
}

impl Chapter {
    pub fn new(time: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }
}

/// A question/answer pair used in the review session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// One complete annotation set
#[derive(Debug, Clone, Default, Serialize)]
pub struct Annotations {
    pub chapters: Vec<Chapter>,
    pub flashcards: Vec<Flashcard>,

    /// Bumped on every replacement, starts at 0 for the initial empty set
    pub revision: u64,

    /// Upload sequence number this set came from (0 before any upload)
    pub sequence: u64,

    /// When the set was published
    pub published_at: Option<DateTime<Utc>>,
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty() && self.flashcards.is_empty()
    }
}

/// Holds the current annotation set and notifies subscribers on replacement
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    tx: Arc<watch::Sender<Arc<Annotations>>>,
}

impl AnnotationStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Annotations::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Annotations> {
        self.tx.borrow().clone()
    }

    /// Subscribe to replacements
    pub fn subscribe(&self) -> watch::Receiver<Arc<Annotations>> {
        self.tx.subscribe()
    }

    /// Replace the whole annotation set. Only the upload orchestrator writes.
    pub(crate) fn replace(
        &self,
        chapters: Vec<Chapter>,
        flashcards: Vec<Flashcard>,
        sequence: u64,
    ) -> Arc<Annotations> {
        let revision = self.tx.borrow().revision + 1;
        let next = Arc::new(Annotations {
            chapters,
            flashcards,
            revision,
            sequence,
            published_at: Some(Utc::now()),
        });

        debug!(
            "📚 Annotations revision {} from upload #{}: {} chapters, {} flashcards",
            revision,
            sequence,
            next.chapters.len(),
            next.flashcards.len()
        );

        self.tx.send_replace(next.clone());
        next
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}
