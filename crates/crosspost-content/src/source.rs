//! Source-content retrieval.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{RawContent, SourceError};

/// Fetches original posts from the origin platform.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the post identified by `source_id`, authorised by `access_token`.
    async fn fetch(&self, source_id: &str, access_token: &str) -> Result<RawContent, SourceError>;
}

/// Content source backed by a JSON HTTP gateway.
///
/// Issues `GET {base_url}/feeds/{source_id}?token={access_token}` and expects a
/// `RawContent` document in response.
pub struct HttpContentSource {
    http: Client,
    base_url: String,
}

impl HttpContentSource {
    /// Create a source for the gateway at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    #[tracing::instrument(skip(self, access_token))]
    async fn fetch(&self, source_id: &str, access_token: &str) -> Result<RawContent, SourceError> {
        let url = format!("{}/feeds/{}", self.base_url, source_id);

        let response = self
            .http
            .get(&url)
            .query(&[("token", access_token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let content: RawContent = serde_json::from_str(&text)
            .map_err(|e| SourceError::InvalidResponse(format!("malformed content: {}", e)))?;

        debug!(
            source_id,
            media = content.media.len(),
            content_type = %content.content_type(),
            "fetched source content"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentType;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feeds/note123"))
            .and(query_param("token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Hello",
                "body": "World",
                "media": [{"url": "https://cdn/v.mp4", "kind": "video"}],
                "source_id": "note123",
                "source_url": "https://www.xiaohongshu.com/explore/note123"
            })))
            .mount(&mock_server)
            .await;

        let source = HttpContentSource::new(mock_server.uri()).unwrap();
        let content = source.fetch("note123", "secret").await.unwrap();

        assert_eq!(content.title, "Hello");
        assert_eq!(content.content_type(), ContentType::Video);
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feeds/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such note"))
            .mount(&mock_server)
            .await;

        let source = HttpContentSource::new(mock_server.uri()).unwrap();
        let err = source.fetch("missing", "token").await.unwrap_err();

        assert!(matches!(err, SourceError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feeds/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let source = HttpContentSource::new(mock_server.uri()).unwrap();
        let err = source.fetch("bad", "token").await.unwrap_err();

        assert!(matches!(err, SourceError::InvalidResponse(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let source = HttpContentSource::new("https://gateway.example.com/").unwrap();
        assert_eq!(source.base_url(), "https://gateway.example.com");
    }

    #[tokio::test]
    async fn test_unreachable_source_error_hides_token() {
        let source = HttpContentSource::new("http://127.0.0.1:1").unwrap();
        let err = source.fetch("note1", "SUPERSECRET").await.unwrap_err();

        assert!(matches!(err, SourceError::Http(_)));
        assert!(!err.to_string().contains("SUPERSECRET"));
        assert!(!format!("{:?}", err).contains("SUPERSECRET"));
    }
}
