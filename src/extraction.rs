//! Client for the chapter/flashcard extraction service

use crate::annotations::{Chapter, Flashcard};
use crate::config::ExtractionConfig;
use crate::error::{ReviewError, Result};
use crate::media::VideoFile;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Validated response of the extraction service
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionPayload {
    pub chapters: Vec<Chapter>,
    pub flashcards: Vec<Flashcard>,
    /// Server-hosted copy of the uploaded video, if the service provides one
    pub source: Option<Url>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    chapters: Vec<Chapter>,
    flashcards: Vec<Flashcard>,
    #[serde(default)]
    source: Option<String>,
}

impl ExtractionPayload {
    pub fn new(chapters: Vec<Chapter>, flashcards: Vec<Flashcard>) -> Self {
        Self {
            chapters,
            flashcards,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Url) -> Self {
        self.source = Some(source);
        self
    }

    /// Parse and validate a response body
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let raw: RawPayload = serde_json::from_slice(body)
            .map_err(|e| ReviewError::InvalidPayload(e.to_string()))?;

        for (index, chapter) in raw.chapters.iter().enumerate() {
            if !chapter.time.is_finite() || chapter.time < 0.0 {
                return Err(ReviewError::InvalidPayload(format!(
                    "chapter {} has invalid time {}",
                    index, chapter.time
                )));
            }
        }

        let source = match raw.source {
            Some(s) => Some(Url::parse(&s).map_err(|e| {
                ReviewError::InvalidPayload(format!("invalid source '{}': {}", s, e))
            })?),
            None => None,
        };

        Ok(Self {
            chapters: raw.chapters,
            flashcards: raw.flashcards,
            source,
        })
    }
}

/// The opaque extraction backend
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Upload a video and return its annotations
    async fn extract(&self, video: &VideoFile) -> Result<ExtractionPayload>;
}

/// Multipart upload to `POST /api/upload`
pub struct HttpExtractionClient {
    config: ExtractionConfig,
    client: reqwest::Client,
}

impl HttpExtractionClient {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(&self, video: &VideoFile) -> Result<ExtractionPayload> {
        let data = video.read_bytes().await?;
        debug!(
            "Uploading {} ({} bytes) to {}",
            video.filename(),
            data.len(),
            self.config.endpoint
        );

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(video.filename())
            .mime_str(video.mime_type())?;
        let form = reqwest::multipart::Form::new().part(self.config.field_name.clone(), part);

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ReviewError::ExtractionFailed(format!(
                "extraction service returned {}: {}",
                status, text
            )));
        }

        let body = response.bytes().await?;
        let payload = ExtractionPayload::from_json(&body)?;

        info!(
            "✅ Extraction returned {} chapters and {} flashcards",
            payload.chapters.len(),
            payload.flashcards.len()
        );
        Ok(payload)
    }
}
