//! Error types shared by the review components

/// Result type for video review operations
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Error types for video review operations
#[derive(thiserror::Error, Debug)]
pub enum ReviewError {
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Invalid extraction payload: {0}")]
    InvalidPayload(String),

    #[error("Review session cannot open without flashcards")]
    EmptySession,

    #[error("Stale extraction response #{sequence} discarded (latest is #{latest})")]
    StaleResponse { sequence: u64, latest: u64 },

    #[error("Unknown or released preview reference: {0}")]
    UnknownPreview(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReviewError {
    /// Whether the user can recover by retrying (re-selecting a file, reopening)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ReviewError::Config(_))
    }
}
