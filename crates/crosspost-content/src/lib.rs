//! Content model and per-platform adaptation for crosspost.
//!
//! This crate provides:
//! - The shared data model (platforms, raw and processed content, publish results)
//! - The `ContentAdapter`, a pure transform enforcing each platform's limits
//! - Collaborator traits for fetching source content and translating it

pub mod adapter;
mod error;
pub mod source;
pub mod translate;
mod types;

pub use adapter::{ContentAdapter, PlatformLimits, truncate_words};
pub use error::{AdaptationError, ParsePlatformError, SourceError, TranslateError};
pub use source::{ContentSource, HttpContentSource};
pub use translate::{GoogleTranslator, PassthroughTranslator, Translator, translate_content};
pub use types::{
    ContentType, MediaKind, MediaRef, Platform, ProcessedContent, PublishResult, RawContent,
};
