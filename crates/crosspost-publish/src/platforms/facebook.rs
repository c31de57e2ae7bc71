//! Facebook Page publisher using the Graph API.

use std::time::Duration;

use async_trait::async_trait;
use crosspost_content::{ContentType, ProcessedContent};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{handle_response, http_client};
use crate::config::FacebookConfig;
use crate::{PublishError, PublishedPost, Publisher};

const API_BASE: &str = "https://graph.facebook.com/v18.0";
const TIMEOUT: Duration = Duration::from_secs(120);

/// Posts to a Facebook Page feed, photo album or video library.
pub struct FacebookPublisher {
    http: Client,
    config: FacebookConfig,
    api_base: String,
}

#[derive(Deserialize)]
struct GraphId {
    id: String,
    #[serde(default)]
    post_id: Option<String>,
}

#[derive(Serialize)]
struct AttachedMedia {
    media_fbid: String,
}

impl FacebookPublisher {
    pub fn new(config: FacebookConfig) -> Result<Self, PublishError> {
        let api_base = config.api_base.clone().unwrap_or_else(|| API_BASE.to_string());
        Ok(Self {
            http: http_client(TIMEOUT)?,
            config,
            api_base,
        })
    }

    fn edge(&self, edge: &str) -> String {
        format!("{}/{}/{}", self.api_base, self.config.page_id, edge)
    }

    async fn post(&self, edge: &str, body: serde_json::Value) -> Result<GraphId, PublishError> {
        let response = self
            .http
            .post(self.edge(edge))
            .query(&[("access_token", self.config.access_token.as_str())])
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn publish_text(&self, message: &str) -> Result<PublishedPost, PublishError> {
        let created = self
            .post("feed", serde_json::json!({ "message": message }))
            .await?;
        Ok(post_link(created.id))
    }

    async fn publish_photo(&self, message: &str, url: &str) -> Result<PublishedPost, PublishError> {
        let created = self
            .post("photos", serde_json::json!({ "url": url, "caption": message }))
            .await?;
        Ok(post_link(created.post_id.unwrap_or(created.id)))
    }

    /// Upload each photo unpublished, then attach them all to one feed post.
    async fn publish_album(
        &self,
        message: &str,
        urls: &[String],
    ) -> Result<PublishedPost, PublishError> {
        let mut attached = Vec::with_capacity(urls.len());
        for url in urls {
            let photo = self
                .post("photos", serde_json::json!({ "url": url, "published": false }))
                .await?;
            debug!(photo_id = %photo.id, "uploaded unpublished photo");
            attached.push(AttachedMedia {
                media_fbid: photo.id,
            });
        }

        let created = self
            .post(
                "feed",
                serde_json::json!({ "message": message, "attached_media": attached }),
            )
            .await?;
        Ok(post_link(created.id))
    }

    async fn publish_video(
        &self,
        content: &ProcessedContent,
        url: &str,
    ) -> Result<PublishedPost, PublishError> {
        let created = self
            .post(
                "videos",
                serde_json::json!({
                    "file_url": url,
                    "title": content.title,
                    "description": content.description,
                }),
            )
            .await?;

        Ok(PublishedPost {
            post_url: Some(format!(
                "https://www.facebook.com/{}/videos/{}",
                self.config.page_id, created.id
            )),
            post_id: created.id,
        })
    }
}

fn post_link(id: String) -> PublishedPost {
    PublishedPost {
        post_url: Some(format!("https://www.facebook.com/{}", id)),
        post_id: id,
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    #[tracing::instrument(skip(self, content), fields(source_id = %content.source_id))]
    async fn publish(&self, content: &ProcessedContent) -> Result<PublishedPost, PublishError> {
        if !self.is_enabled() {
            return Err(PublishError::NotConfigured);
        }

        let message = content.description.as_str();
        match (content.content_type, content.media_urls.as_slice()) {
            (ContentType::Text, _) => self.publish_text(message).await,
            (ContentType::Video, [url, ..]) => self.publish_video(content, url).await,
            (ContentType::Image, [url]) => self.publish_photo(message, url).await,
            (ContentType::Image, urls) if !urls.is_empty() => {
                self.publish_album(message, urls).await
            }
            (ContentType::Image | ContentType::Video, _) => Err(PublishError::MissingMedia),
            (ContentType::Mixed, _) => Err(PublishError::Unsupported(
                "mixed media posts are not supported on Facebook".to_string(),
            )),
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
            && !self.config.access_token.is_empty()
            && !self.config.page_id.is_empty()
    }

    fn name(&self) -> &str {
        "Facebook"
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_content::Platform;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer) -> FacebookPublisher {
        FacebookPublisher::new(FacebookConfig {
            enabled: true,
            access_token: "fb".to_string(),
            page_id: "page1".to_string(),
            api_base: Some(server.uri()),
        })
        .unwrap()
    }

    fn content(content_type: ContentType, media_urls: Vec<&str>) -> ProcessedContent {
        ProcessedContent {
            platform: Platform::Facebook,
            title: "Trip".to_string(),
            description: "Trip\n\nphotos".to_string(),
            content_type,
            media_urls: media_urls.into_iter().map(String::from).collect(),
            tags: vec![],
            original_title: "Trip".to_string(),
            original_description: "photos".to_string(),
            source_id: "n3".to_string(),
            source_url: "https://example.com/n3".to_string(),
        }
    }

    #[tokio::test]
    async fn test_text_post() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/page1/feed"))
            .and(query_param("access_token", "fb"))
            .and(body_partial_json(serde_json::json!({"message": "Trip\n\nphotos"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page1_55"})),
            )
            .mount(&server)
            .await;

        let post = publisher(&server)
            .publish(&content(ContentType::Text, vec![]))
            .await
            .unwrap();

        assert_eq!(post.post_id, "page1_55");
        assert_eq!(
            post.post_url.as_deref(),
            Some("https://www.facebook.com/page1_55")
        );
    }

    #[tokio::test]
    async fn test_single_photo() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/page1/photos"))
            .and(body_partial_json(serde_json::json!({"url": "https://cdn/a.jpg"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "photo1",
                "post_id": "page1_66"
            })))
            .mount(&server)
            .await;

        let post = publisher(&server)
            .publish(&content(ContentType::Image, vec!["https://cdn/a.jpg"]))
            .await
            .unwrap();

        assert_eq!(post.post_id, "page1_66");
    }

    #[tokio::test]
    async fn test_multi_photo_album() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/page1/photos"))
            .and(body_partial_json(serde_json::json!({"published": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "p"})))
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/page1/feed"))
            .and(body_partial_json(serde_json::json!({
                "attached_media": [{"media_fbid": "p"}, {"media_fbid": "p"}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page1_77"})),
            )
            .mount(&server)
            .await;

        let post = publisher(&server)
            .publish(&content(
                ContentType::Image,
                vec!["https://cdn/a.jpg", "https://cdn/b.jpg"],
            ))
            .await
            .unwrap();

        assert_eq!(post.post_id, "page1_77");
    }

    #[tokio::test]
    async fn test_video_post() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/page1/videos"))
            .and(body_partial_json(serde_json::json!({"file_url": "https://cdn/v.mp4"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "v9"})))
            .mount(&server)
            .await;

        let post = publisher(&server)
            .publish(&content(ContentType::Video, vec!["https://cdn/v.mp4"]))
            .await
            .unwrap();

        assert_eq!(
            post.post_url.as_deref(),
            Some("https://www.facebook.com/page1/videos/v9")
        );
    }

    #[tokio::test]
    async fn test_graph_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/page1/feed"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Invalid OAuth access token", "code": 190}
            })))
            .mount(&server)
            .await;

        let err = publisher(&server)
            .publish(&content(ContentType::Text, vec![]))
            .await
            .unwrap_err();

        match err {
            PublishError::Api { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Invalid OAuth"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_enabled_requires_page_id() {
        let publisher = FacebookPublisher::new(FacebookConfig {
            enabled: true,
            access_token: "fb".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(!publisher.is_enabled());
    }

    #[tokio::test]
    async fn test_transport_error_hides_page_token() {
        let publisher = FacebookPublisher::new(FacebookConfig {
            enabled: true,
            access_token: "PAGETOKEN".to_string(),
            page_id: "page1".to_string(),
            api_base: Some("http://127.0.0.1:1".to_string()),
        })
        .unwrap();

        let err = publisher
            .publish(&content(ContentType::Text, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Http(_)));
        assert!(!err.to_string().contains("PAGETOKEN"));
    }
}
