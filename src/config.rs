use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::review::ReplacementPolicy;

/// Configuration for the video review tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Extraction service settings
    pub extraction: ExtractionConfig,

    /// Player settings
    pub player: PlayerConfig,

    /// Review session settings
    pub review: ReviewConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Upload endpoint of the extraction service
    pub endpoint: String,

    /// Multipart field carrying the video
    pub field_name: String,

    /// Request timeout (seconds)
    pub timeout_seconds: u64,

    /// Extensions the file picker accepts (best-effort)
    pub accepted_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Read media duration with ffprobe for seek clamping
    pub detect_duration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReviewConfig {
    /// Session behaviour when flashcards are replaced mid-review
    pub on_replace: ReplacementPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing env-filter directive
    pub level: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/api/upload".to_string(),
            field_name: "video".to_string(),
            timeout_seconds: 300,
            accepted_extensions: vec!["mp4".to_string()],
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            detect_duration: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "video_review=info,warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the first readable file, then the environment
    pub fn load() -> Result<Self> {
        let config_paths = [
            "video-review.toml",
            "config/video-review.toml",
            "~/.config/video-review/config.toml",
        ];

        for path in &config_paths {
            let expanded = expand_home(path);
            if let Ok(config_str) = std::fs::read_to_string(&expanded) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", expanded);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", expanded, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config {}: {}", path.display(), e))?;
        let config = toml::from_str(&config_str)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("VIDEO_REVIEW_ENDPOINT") {
            config.extraction.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("VIDEO_REVIEW_TIMEOUT") {
            config.extraction.timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("VIDEO_REVIEW_TIMEOUT must be a number of seconds"))?;
        }

        if let Ok(log_level) = std::env::var("VIDEO_REVIEW_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(&self.extraction.endpoint)
            .map_err(|e| anyhow!("Invalid extraction endpoint '{}': {}", self.extraction.endpoint, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!("Extraction endpoint must be http or https"));
        }

        if self.extraction.timeout_seconds == 0 {
            return Err(anyhow!("timeout_seconds must be greater than 0"));
        }

        if self.extraction.field_name.trim().is_empty() {
            return Err(anyhow!("field_name must not be empty"));
        }

        Ok(())
    }

    /// Runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Video Review Configuration:\n\
            - Extraction Endpoint: {}\n\
            - Upload Field: {}\n\
            - Timeout: {}s\n\
            - Accepted Extensions: {}\n\
            - Detect Duration: {}\n\
            - On Flashcard Replace: {:?}",
            self.extraction.endpoint,
            self.extraction.field_name,
            self.extraction.timeout_seconds,
            self.extraction.accepted_extensions.join(", "),
            self.player.detect_duration,
            self.review.on_replace
        )
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home, rest),
        _ => path.to_string(),
    }
}

/// Fluent overrides, mostly for tests
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.extraction.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.extraction.timeout_seconds = seconds;
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.config.extraction.field_name = field_name.into();
        self
    }

    pub fn with_replacement_policy(mut self, policy: ReplacementPolicy) -> Self {
        self.config.review.on_replace = policy;
        self
    }

    pub fn detect_duration(mut self, enable: bool) -> Self {
        self.config.player.detect_duration = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
