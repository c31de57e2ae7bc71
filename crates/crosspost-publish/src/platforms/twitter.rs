//! Twitter/X publisher.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crosspost_content::{ContentType, ProcessedContent};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, download, handle_response, http_client};
use crate::config::TwitterConfig;
use crate::{PublishError, PublishedPost, Publisher};

const API_BASE: &str = "https://api.twitter.com";
const UPLOAD_BASE: &str = "https://upload.twitter.com";
const TIMEOUT: Duration = Duration::from_secs(60);
const VIDEO_CHUNK_SIZE: usize = 1024 * 1024;

/// Posts tweets through the v2 API, with media uploaded via the v1.1 media endpoint.
pub struct TwitterPublisher {
    http: Client,
    config: TwitterConfig,
    api_base: String,
    upload_base: String,
}

impl TwitterPublisher {
    pub fn new(config: TwitterConfig) -> Result<Self, PublishError> {
        let api_base = config.api_base.clone().unwrap_or_else(|| API_BASE.to_string());
        let upload_base = config
            .upload_base
            .clone()
            .unwrap_or_else(|| UPLOAD_BASE.to_string());

        Ok(Self {
            http: http_client(TIMEOUT)?,
            config,
            api_base,
            upload_base,
        })
    }

    async fn upload_image(&self, url: &str) -> Result<String, PublishError> {
        let bytes = download(&self.http, url).await?;
        let response = self
            .http
            .post(self.upload_url())
            .bearer_auth(&self.config.bearer_token)
            .form(&[("media_data", STANDARD.encode(&bytes))])
            .send()
            .await?;

        let uploaded: MediaUploadResponse = handle_response(response).await?;
        debug!(media_id = %uploaded.media_id_string, "uploaded image");
        Ok(uploaded.media_id_string)
    }

    /// Chunked INIT/APPEND/FINALIZE upload, polling until processing finishes.
    async fn upload_video(&self, url: &str) -> Result<String, PublishError> {
        let bytes = download(&self.http, url).await?;

        let response = self
            .http
            .post(self.upload_url())
            .bearer_auth(&self.config.bearer_token)
            .form(&[
                ("command", "INIT".to_string()),
                ("total_bytes", bytes.len().to_string()),
                ("media_type", "video/mp4".to_string()),
                ("media_category", "tweet_video".to_string()),
            ])
            .send()
            .await?;
        let init: MediaUploadResponse = handle_response(response).await?;
        let media_id = init.media_id_string;

        for (index, chunk) in bytes.chunks(VIDEO_CHUNK_SIZE).enumerate() {
            let response = self
                .http
                .post(self.upload_url())
                .bearer_auth(&self.config.bearer_token)
                .form(&[
                    ("command", "APPEND".to_string()),
                    ("media_id", media_id.clone()),
                    ("segment_index", index.to_string()),
                    ("media_data", STANDARD.encode(chunk)),
                ])
                .send()
                .await?;
            check_status(response).await?;
        }

        let response = self
            .http
            .post(self.upload_url())
            .bearer_auth(&self.config.bearer_token)
            .form(&[("command", "FINALIZE"), ("media_id", media_id.as_str())])
            .send()
            .await?;
        let mut state: MediaUploadResponse = handle_response(response).await?;

        while let Some(info) = state.processing_info.take() {
            match info.state.as_str() {
                "succeeded" => break,
                "failed" => {
                    return Err(PublishError::InvalidResponse(format!(
                        "video processing failed for media {}",
                        media_id
                    )));
                }
                _ => {
                    tokio::time::sleep(Duration::from_secs(info.check_after_secs.unwrap_or(1)))
                        .await;
                    let response = self
                        .http
                        .get(self.upload_url())
                        .bearer_auth(&self.config.bearer_token)
                        .query(&[("command", "STATUS"), ("media_id", media_id.as_str())])
                        .send()
                        .await?;
                    state = handle_response(response).await?;
                }
            }
        }

        debug!(media_id = %media_id, size = bytes.len(), "uploaded video");
        Ok(media_id)
    }

    fn upload_url(&self) -> String {
        format!("{}/1.1/media/upload.json", self.upload_base)
    }

    async fn post_tweet(
        &self,
        text: &str,
        media_ids: Vec<String>,
    ) -> Result<PublishedPost, PublishError> {
        let request = TweetRequest {
            text,
            media: (!media_ids.is_empty()).then_some(TweetMedia { media_ids }),
        };

        let response = self
            .http
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(&self.config.bearer_token)
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        if response.status() != StatusCode::CREATED {
            return Err(PublishError::InvalidResponse(format!(
                "expected 201 Created, got {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let body: TweetResponse = serde_json::from_str(&text)
            .map_err(|e| PublishError::InvalidResponse(format!("malformed body: {}", e)))?;

        Ok(PublishedPost {
            post_url: Some(format!("https://twitter.com/i/web/status/{}", body.data.id)),
            post_id: body.data.id,
        })
    }
}

#[derive(Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia>,
}

#[derive(Serialize)]
struct TweetMedia {
    media_ids: Vec<String>,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
    #[serde(default)]
    processing_info: Option<ProcessingInfo>,
}

#[derive(Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    check_after_secs: Option<u64>,
}

#[async_trait]
impl Publisher for TwitterPublisher {
    #[tracing::instrument(skip(self, content), fields(source_id = %content.source_id))]
    async fn publish(&self, content: &ProcessedContent) -> Result<PublishedPost, PublishError> {
        if !self.is_enabled() {
            return Err(PublishError::NotConfigured);
        }

        let media_ids = match content.content_type {
            ContentType::Text => Vec::new(),
            ContentType::Image => {
                let mut ids = Vec::with_capacity(content.media_urls.len());
                for url in &content.media_urls {
                    ids.push(self.upload_image(url).await?);
                }
                ids
            }
            ContentType::Video => {
                let url = content
                    .media_urls
                    .first()
                    .ok_or(PublishError::MissingMedia)?;
                vec![self.upload_video(url).await?]
            }
            other => {
                return Err(PublishError::Unsupported(format!(
                    "{} posts are not supported on Twitter",
                    other
                )));
            }
        };

        self.post_tweet(&content.description, media_ids).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bearer_token.is_empty()
    }

    fn name(&self) -> &str {
        "Twitter"
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_content::Platform;
    use wiremock::matchers::{
        body_partial_json, body_string_contains, header, method, path, query_param,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer) -> TwitterPublisher {
        TwitterPublisher::new(TwitterConfig {
            enabled: true,
            bearer_token: "token".to_string(),
            api_base: Some(server.uri()),
            upload_base: Some(server.uri()),
        })
        .unwrap()
    }

    fn content(content_type: ContentType, media_urls: Vec<String>) -> ProcessedContent {
        ProcessedContent {
            platform: Platform::Twitter,
            title: "Hello".to_string(),
            description: "Hello world".to_string(),
            content_type,
            media_urls,
            tags: vec![],
            original_title: "Hello".to_string(),
            original_description: "world".to_string(),
            source_id: "n1".to_string(),
            source_url: "https://example.com/n1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_text_tweet() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header("authorization", "Bearer token"))
            .and(body_partial_json(serde_json::json!({"text": "Hello world"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"data": {"id": "123", "text": "Hello world"}})),
            )
            .mount(&server)
            .await;

        let post = publisher(&server)
            .publish(&content(ContentType::Text, vec![]))
            .await
            .unwrap();

        assert_eq!(post.post_id, "123");
        assert_eq!(
            post.post_url.as_deref(),
            Some("https://twitter.com/i/web/status/123")
        );
    }

    #[tokio::test]
    async fn test_image_tweet_uploads_media_first() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img/1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"media_id_string": "m-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_partial_json(
                serde_json::json!({"media": {"media_ids": ["m-1"]}}),
            ))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"data": {"id": "9"}})),
            )
            .mount(&server)
            .await;

        let image = format!("{}/img/1.jpg", server.uri());
        let post = publisher(&server)
            .publish(&content(ContentType::Image, vec![image]))
            .await
            .unwrap();

        assert_eq!(post.post_id, "9");
    }

    #[tokio::test]
    async fn test_api_error_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(403).set_body_string("duplicate content"))
            .mount(&server)
            .await;

        let err = publisher(&server)
            .publish(&content(ContentType::Text, vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_unexpected_success_status_is_invalid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"id": "1"}})),
            )
            .mount(&server)
            .await;

        let err = publisher(&server)
            .publish(&content(ContentType::Text, vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_video_tweet_chunked_upload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .and(body_string_contains("command=INIT"))
            .respond_with(
                ResponseTemplate::new(202)
                    .set_body_json(serde_json::json!({"media_id_string": "v-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .and(body_string_contains("command=APPEND"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .and(body_string_contains("command=FINALIZE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "media_id_string": "v-1",
                "processing_info": {"state": "pending", "check_after_secs": 0}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/1.1/media/upload.json"))
            .and(query_param("command", "STATUS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "media_id_string": "v-1",
                "processing_info": {"state": "succeeded"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_partial_json(
                serde_json::json!({"media": {"media_ids": ["v-1"]}}),
            ))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"data": {"id": "77"}})),
            )
            .mount(&server)
            .await;

        let video = format!("{}/v/clip.mp4", server.uri());
        let post = publisher(&server)
            .publish(&content(ContentType::Video, vec![video]))
            .await
            .unwrap();

        assert_eq!(post.post_id, "77");
    }

    #[tokio::test]
    async fn test_video_without_media_is_rejected() {
        let server = MockServer::start().await;
        let err = publisher(&server)
            .publish(&content(ContentType::Video, vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::MissingMedia));
    }

    #[test]
    fn test_enabled_requires_token() {
        let publisher = TwitterPublisher::new(TwitterConfig {
            enabled: true,
            ..Default::default()
        })
        .unwrap();
        assert!(!publisher.is_enabled());
        assert_eq!(publisher.timeout(), Duration::from_secs(60));
    }
}
