//! Error types for content handling.

use thiserror::Error;

use crate::{ContentType, Platform};

/// Errors raised while adapting content for a platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptationError {
    /// The platform cannot carry this kind of content.
    #[error("{platform} does not accept {content_type} content")]
    UnsupportedContentType {
        platform: Platform,
        content_type: ContentType,
    },
}

/// Errors that can occur when fetching source content.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The content source answered with a non-success status.
    #[error("source returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid response from the content source.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur when translating text.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Invalid response from the translation backend.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// An unrecognised platform name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform: {0}")]
pub struct ParsePlatformError(pub String);

// Request URLs carry access tokens and API keys in their query strings.
impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Http(e.without_url())
    }
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        TranslateError::Http(e.without_url())
    }
}
