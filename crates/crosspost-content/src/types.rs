//! Content types shared across crosspost.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParsePlatformError;

/// A destination platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Short-form social (Twitter/X).
    Twitter,
    /// Short video (TikTok).
    TikTok,
    /// General social (Facebook pages).
    Facebook,
    /// Long-form video (YouTube).
    YouTube,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Platform; 4] = [
        Platform::Twitter,
        Platform::TikTok,
        Platform::Facebook,
        Platform::YouTube,
    ];

    /// Wire name of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::TikTok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::YouTube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twitter" | "x" => Ok(Platform::Twitter),
            "tiktok" => Ok(Platform::TikTok),
            "facebook" => Ok(Platform::Facebook),
            "youtube" => Ok(Platform::YouTube),
            _ => Err(ParsePlatformError(s.to_string())),
        }
    }
}

/// Kind of content carried by a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Mixed,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Mixed => "mixed",
        })
    }
}

/// Kind of a single media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A reference to one piece of media in the source post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
}

impl MediaRef {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Image,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Video,
        }
    }
}

/// Source content as fetched from the origin platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContent {
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Media in original order: images, or a single video.
    #[serde(default)]
    pub media: Vec<MediaRef>,
    pub source_id: String,
    pub source_url: String,
}

impl RawContent {
    /// Determine the content type of this source.
    pub fn content_type(&self) -> ContentType {
        if self.media.iter().any(|m| m.kind == MediaKind::Video) {
            ContentType::Video
        } else if !self.media.is_empty() {
            ContentType::Image
        } else {
            ContentType::Text
        }
    }

    /// URL of the source video, if any.
    pub fn video_url(&self) -> Option<&str> {
        self.media
            .iter()
            .find(|m| m.kind == MediaKind::Video)
            .map(|m| m.url.as_str())
    }

    /// Image URLs in original order.
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.media
            .iter()
            .filter(|m| m.kind == MediaKind::Image)
            .map(|m| m.url.as_str())
    }
}

/// Content adapted for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedContent {
    pub platform: Platform,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub media_urls: Vec<String>,
    pub tags: Vec<String>,

    // Pre-adaptation values
    pub original_title: String,
    pub original_description: String,
    pub source_id: String,
    pub source_url: String,
}

/// Outcome of publishing to a single platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub platform: Platform,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PublishResult {
    /// A successful publish.
    pub fn succeeded(platform: Platform, post_id: String, post_url: Option<String>) -> Self {
        Self {
            platform,
            success: true,
            post_id: Some(post_id),
            post_url,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A failed publish.
    pub fn failed(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            platform,
            success: false,
            post_id: None,
            post_url: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(media: Vec<MediaRef>) -> RawContent {
        RawContent {
            title: "t".to_string(),
            body: "b".to_string(),
            media,
            source_id: "id".to_string(),
            source_url: "https://example.com/id".to_string(),
        }
    }

    #[test]
    fn test_content_type_detection() {
        assert_eq!(raw(vec![]).content_type(), ContentType::Text);
        assert_eq!(
            raw(vec![MediaRef::image("a"), MediaRef::image("b")]).content_type(),
            ContentType::Image
        );
        assert_eq!(
            raw(vec![MediaRef::video("v")]).content_type(),
            ContentType::Video
        );
        // A video cover image does not demote the post to image content
        assert_eq!(
            raw(vec![MediaRef::image("cover"), MediaRef::video("v")]).content_type(),
            ContentType::Video
        );
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("twitter".parse::<Platform>(), Ok(Platform::Twitter));
        assert_eq!("X".parse::<Platform>(), Ok(Platform::Twitter));
        assert_eq!(" TikTok ".parse::<Platform>(), Ok(Platform::TikTok));
        assert_eq!("youtube".parse::<Platform>(), Ok(Platform::YouTube));
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_serde_matches_display() {
        for platform in Platform::ALL {
            let json = serde_json::to_value(platform).unwrap();
            assert_eq!(json, serde_json::Value::String(platform.to_string()));
        }
    }

    #[test]
    fn test_publish_result_failed_omits_post_fields() {
        let result = PublishResult::failed(Platform::Facebook, "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("post_id").is_none());
    }
}
