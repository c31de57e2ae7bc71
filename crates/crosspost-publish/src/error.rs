//! Error types for publishing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors a publisher can report for a single publish attempt.
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The platform API rejected the request.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Invalid response from the platform API.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The platform cannot publish this content.
    #[error("unsupported content: {0}")]
    Unsupported(String),

    /// The content carries no media but the platform requires some.
    #[error("no media URL provided")]
    MissingMedia,

    /// The publisher is missing credentials.
    #[error("publisher not configured")]
    NotConfigured,
}

// Graph API requests carry the page token in the query string.
impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        PublishError::Http(e.without_url())
    }
}

/// Errors rejected before a dispatch starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Invalid dispatch request.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors loading publisher configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this platform.
    #[error("invalid config in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
