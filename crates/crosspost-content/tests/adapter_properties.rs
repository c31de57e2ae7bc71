//! Property-based tests for content adaptation.

use crosspost_content::{
    ContentAdapter, ContentType, MediaRef, Platform, PlatformLimits, RawContent, truncate_words,
};
use proptest::prelude::*;

// Strategy for text made of words separated by single or repeated whitespace
fn wordy_text() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-zA-Zéü]{1,12}", "[ \n]{1,3}"), 0..800).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(word, gap)| format!("{word}{gap}"))
            .collect::<String>()
    })
}

fn short_title() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,60}".prop_map(|s| s.to_string())
}

fn raw(title: String, body: String, media: Vec<MediaRef>) -> RawContent {
    RawContent {
        title,
        body,
        media,
        source_id: "note".to_string(),
        source_url: "https://www.xiaohongshu.com/explore/note".to_string(),
    }
}

fn limited_platform() -> impl Strategy<Value = Platform> {
    prop_oneof![
        Just(Platform::Twitter),
        Just(Platform::TikTok),
        Just(Platform::YouTube),
    ]
}

proptest! {
    // Adapted descriptions never exceed the platform limit
    #[test]
    fn description_within_limit(
        platform in limited_platform(),
        title in short_title(),
        body in wordy_text(),
    ) {
        let adapter = ContentAdapter::default();
        let content = raw(title, body, vec![MediaRef::video("https://cdn/v.mp4")]);
        let out = adapter.process(&content, platform).unwrap();

        let limit = PlatformLimits::for_platform(platform).max_description.unwrap();
        prop_assert!(
            out.description.chars().count() <= limit,
            "{} description is {} chars, limit {}",
            platform,
            out.description.chars().count(),
            limit
        );

        if let Some(max_title) = PlatformLimits::for_platform(platform).max_title {
            prop_assert!(out.title.chars().count() <= max_title);
        }
    }

    // Truncation keeps a prefix of the original that ends on a word boundary
    #[test]
    fn truncation_ends_on_word_boundary(text in wordy_text(), max in 0usize..400) {
        let truncated = truncate_words(&text, max);

        prop_assert!(truncated.chars().count() <= max || truncated == text);
        prop_assert!(text.starts_with(truncated));

        if truncated != text && !truncated.is_empty() {
            // The character following the kept prefix must be whitespace
            let next = text[truncated.len()..].chars().next();
            prop_assert!(next.is_some_and(char::is_whitespace));
        }
    }

    // Media lists are capped and keep their original order
    #[test]
    fn media_cap_preserves_order(count in 0usize..12) {
        let adapter = ContentAdapter::default();
        let media: Vec<MediaRef> = (0..count).map(|i| MediaRef::image(format!("img{i}"))).collect();
        let content = raw("Title".to_string(), "Body".to_string(), media);
        let out = adapter.process(&content, Platform::Twitter).unwrap();

        let expected: Vec<String> = (0..count.min(4)).map(|i| format!("img{i}")).collect();
        prop_assert_eq!(out.media_urls, expected);
    }

    // Video-only platforms reject anything that is not video
    #[test]
    fn video_only_platforms_reject_stills(
        platform in prop_oneof![Just(Platform::TikTok), Just(Platform::YouTube)],
        images in 0usize..5,
    ) {
        let adapter = ContentAdapter::default();
        let media = (0..images).map(|i| MediaRef::image(format!("img{i}"))).collect();
        let content = raw("Title".to_string(), "Body".to_string(), media);
        prop_assert!(adapter.process(&content, platform).is_err());
    }

    // Adaptation is deterministic
    #[test]
    fn adaptation_is_deterministic(title in short_title(), body in wordy_text()) {
        let adapter = ContentAdapter::default();
        let content = raw(title, body, vec![]);
        let a = adapter.process(&content, Platform::Twitter).unwrap();
        let b = adapter.process(&content, Platform::Twitter).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn text_content_reaches_general_platforms() {
    let adapter = ContentAdapter::default();
    let content = raw("Title".to_string(), "Body".to_string(), vec![]);

    for platform in [Platform::Twitter, Platform::Facebook] {
        let out = adapter.process(&content, platform).unwrap();
        assert_eq!(out.content_type, ContentType::Text);
        assert!(out.media_urls.is_empty());
    }
}
