//! Per-platform content adaptation.
//!
//! `ContentAdapter::process` is a pure function of its inputs: it never performs
//! I/O and produces the same output for the same `(RawContent, Platform)` pair.

use crate::{AdaptationError, ContentType, Platform, ProcessedContent, RawContent};

/// Separator between title and description.
const SEPARATOR: &str = "\n\n";

/// Continuation marker appended after truncated text.
const ELLIPSIS: &str = "...";

/// Default name of the origin platform used in attribution text.
const DEFAULT_SOURCE_LABEL: &str = "Xiaohongshu";

/// Published limits for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformLimits {
    /// Maximum description length in characters (`None` = unbounded).
    pub max_description: Option<usize>,
    /// Maximum number of media items (`None` = unbounded).
    pub max_media: Option<usize>,
    /// Maximum title length in characters (`None` = no separate title).
    pub max_title: Option<usize>,
    /// Content types the platform accepts.
    pub accepts: &'static [ContentType],
}

impl PlatformLimits {
    /// Limits table for a platform.
    pub const fn for_platform(platform: Platform) -> Self {
        const ANY: &[ContentType] = &[ContentType::Text, ContentType::Image, ContentType::Video];
        const VIDEO_ONLY: &[ContentType] = &[ContentType::Video];

        match platform {
            Platform::Twitter => Self {
                max_description: Some(280),
                max_media: Some(4),
                max_title: None,
                accepts: ANY,
            },
            Platform::TikTok => Self {
                max_description: Some(2200),
                max_media: Some(1),
                max_title: None,
                accepts: VIDEO_ONLY,
            },
            Platform::Facebook => Self {
                max_description: None,
                max_media: None,
                max_title: None,
                accepts: ANY,
            },
            Platform::YouTube => Self {
                max_description: Some(5000),
                max_media: Some(1),
                max_title: Some(100),
                accepts: VIDEO_ONLY,
            },
        }
    }

    /// Whether the platform can carry this content type.
    pub fn accepts(&self, content_type: ContentType) -> bool {
        self.accepts.contains(&content_type)
    }
}

/// Transforms raw source content into platform-legal payloads.
#[derive(Debug, Clone)]
pub struct ContentAdapter {
    source_label: String,
}

impl Default for ContentAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_LABEL)
    }
}

impl ContentAdapter {
    /// Create an adapter that attributes content to `source_label`.
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
        }
    }

    /// Name of the origin platform used in attribution text.
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// Adapt `content` for `platform`.
    pub fn process(
        &self,
        content: &RawContent,
        platform: Platform,
    ) -> Result<ProcessedContent, AdaptationError> {
        let limits = PlatformLimits::for_platform(platform);
        let content_type = content.content_type();

        if !limits.accepts(content_type) {
            return Err(AdaptationError::UnsupportedContentType {
                platform,
                content_type,
            });
        }

        let media_cap = limits.max_media.unwrap_or(usize::MAX);
        let media_urls: Vec<String> = match content_type {
            ContentType::Video => content
                .video_url()
                .map(str::to_string)
                .into_iter()
                .take(media_cap)
                .collect(),
            ContentType::Image | ContentType::Mixed => content
                .image_urls()
                .take(media_cap)
                .map(str::to_string)
                .collect(),
            ContentType::Text => Vec::new(),
        };

        let url = &content.source_url;
        let (title, description, tags) = match platform {
            Platform::Twitter => {
                let attribution = format!("{SEPARATOR}Source: {url}");
                let text = compose_with_attribution(
                    &content.title,
                    &content.body,
                    limits.max_description.unwrap_or(usize::MAX),
                    &attribution,
                );
                (content.title.clone(), text, Vec::new())
            }
            Platform::TikTok => {
                let attribution = format!("{SEPARATOR}📱 From {}: {url}", self.source_label);
                let text = compose_with_attribution(
                    &content.title,
                    &content.body,
                    limits.max_description.unwrap_or(usize::MAX),
                    &attribution,
                );
                (content.title.clone(), text, Vec::new())
            }
            Platform::Facebook => {
                let mut text = content.title.clone();
                if !content.body.is_empty() {
                    text.push_str(SEPARATOR);
                    text.push_str(&content.body);
                }
                text.push_str(&format!(
                    "{SEPARATOR}🔗 Original post from {}:\n{url}",
                    self.source_label
                ));
                (content.title.clone(), text, Vec::new())
            }
            Platform::YouTube => {
                let title = clip(&content.title, limits.max_title.unwrap_or(usize::MAX));
                let max = limits.max_description.unwrap_or(usize::MAX);
                let mut description = clip(&content.body, max);
                let label = &self.source_label;
                let hashtag: String = label.split_whitespace().collect();
                let attribution = format!(
                    "{SEPARATOR}━━━━━━━━━━━━━━━━━━━━━━\n📱 Original Content from {label}\n🔗 Source: {url}\n\n#{hashtag} #ContentSharing"
                );
                if char_len(&description) + char_len(&attribution) <= max {
                    description.push_str(&attribution);
                }
                let tags = vec![self.source_label.clone(), "ContentSharing".to_string()];
                (title, description, tags)
            }
        };

        Ok(ProcessedContent {
            platform,
            title,
            description,
            content_type,
            media_urls,
            tags,
            original_title: content.title.clone(),
            original_description: content.body.clone(),
            source_id: content.source_id.clone(),
            source_url: content.source_url.clone(),
        })
    }
}

/// Truncate `text` to at most `max_chars` characters at a word boundary.
///
/// The cut is placed at the last whitespace at or before `max_chars`, so no
/// word is ever split. Returns an empty string when the first `max_chars`
/// characters contain no whitespace at all.
pub fn truncate_words(text: &str, max_chars: usize) -> &str {
    let Some((cut, next)) = text.char_indices().nth(max_chars) else {
        return text;
    };

    let prefix = &text[..cut];
    if next.is_whitespace() {
        return prefix.trim_end();
    }

    match prefix.rfind(char::is_whitespace) {
        Some(idx) => prefix[..idx].trim_end(),
        None => "",
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Shorten `text` to fit `max_chars`, marking the cut with an ellipsis.
fn clip(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let budget = max_chars.saturating_sub(char_len(ELLIPSIS));
    format!("{}{ELLIPSIS}", truncate_words(text, budget))
}

/// Join title and description within `max_chars`, truncating only the description.
fn compose(title: &str, description: &str, max_chars: usize) -> String {
    if description.is_empty() {
        return clip(title, max_chars);
    }

    let combined = format!("{title}{SEPARATOR}{description}");
    if char_len(&combined) <= max_chars {
        return combined;
    }

    let overhead = char_len(title) + char_len(SEPARATOR) + char_len(ELLIPSIS);
    if max_chars > overhead {
        let truncated = truncate_words(description, max_chars - overhead);
        format!("{title}{SEPARATOR}{truncated}{ELLIPSIS}")
    } else {
        clip(title, max_chars)
    }
}

/// Compose text and append `attribution` only if it still fits.
fn compose_with_attribution(
    title: &str,
    description: &str,
    max_chars: usize,
    attribution: &str,
) -> String {
    let mut text = compose(title, description, max_chars);
    if char_len(&text) + char_len(attribution) <= max_chars {
        text.push_str(attribution);
    }
    text
}
