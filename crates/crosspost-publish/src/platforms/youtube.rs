//! YouTube publisher using the Data API resumable upload protocol.

use std::time::Duration;

use async_trait::async_trait;
use crosspost_content::{ContentType, ProcessedContent};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{check_status, download, handle_response, http_client};
use crate::config::YouTubeConfig;
use crate::{PublishError, PublishedPost, Publisher};

const UPLOAD_BASE: &str = "https://www.googleapis.com";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_PRIVACY_STATUS: &str = "private";
/// "People & Blogs"
const CATEGORY_ID: &str = "22";

/// Uploads videos to a YouTube channel.
pub struct YouTubePublisher {
    http: Client,
    config: YouTubeConfig,
    upload_base: String,
    token_url: String,
    access_token: RwLock<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoMetadata<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    category_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
}

#[derive(Deserialize)]
struct VideoResource {
    id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl YouTubePublisher {
    pub fn new(config: YouTubeConfig) -> Result<Self, PublishError> {
        let upload_base = config
            .upload_base
            .clone()
            .unwrap_or_else(|| UPLOAD_BASE.to_string());
        let token_url = config
            .token_url
            .clone()
            .unwrap_or_else(|| TOKEN_URL.to_string());
        let access_token = RwLock::new(config.access_token.clone());

        Ok(Self {
            http: http_client(TIMEOUT)?,
            config,
            upload_base,
            token_url,
            access_token,
        })
    }

    fn can_refresh(&self) -> bool {
        !self.config.refresh_token.is_empty()
            && !self.config.client_id.is_empty()
            && !self.config.client_secret.is_empty()
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh_access_token(&self) -> Result<(), PublishError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = handle_response(response).await?;
        *self.access_token.write().await = token.access_token;
        info!("refreshed YouTube access token");
        Ok(())
    }

    /// Request a resumable upload session.
    async fn start_upload(
        &self,
        content: &ProcessedContent,
        size: usize,
    ) -> Result<reqwest::Response, PublishError> {
        let metadata = VideoMetadata {
            snippet: Snippet {
                title: &content.title,
                description: &content.description,
                tags: &content.tags,
                category_id: CATEGORY_ID,
            },
            status: Status {
                privacy_status: self
                    .config
                    .privacy_status
                    .as_deref()
                    .unwrap_or(DEFAULT_PRIVACY_STATUS),
            },
        };

        let token = self.access_token.read().await.clone();
        Ok(self
            .http
            .post(format!("{}/upload/youtube/v3/videos", self.upload_base))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(token)
            .header("X-Upload-Content-Type", "video/*")
            .header("X-Upload-Content-Length", size.to_string())
            .json(&metadata)
            .send()
            .await?)
    }

    /// Open an upload session, refreshing the access token once on 401.
    async fn upload_session(
        &self,
        content: &ProcessedContent,
        size: usize,
    ) -> Result<String, PublishError> {
        let mut response = self.start_upload(content, size).await?;
        if response.status() == StatusCode::UNAUTHORIZED && self.can_refresh() {
            debug!("access token rejected, refreshing");
            self.refresh_access_token().await?;
            response = self.start_upload(content, size).await?;
        }

        let response = check_status(response).await?;
        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| PublishError::InvalidResponse("missing upload location".to_string()))
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    #[tracing::instrument(skip(self, content), fields(source_id = %content.source_id))]
    async fn publish(&self, content: &ProcessedContent) -> Result<PublishedPost, PublishError> {
        if !self.is_enabled() {
            return Err(PublishError::NotConfigured);
        }
        if content.content_type != ContentType::Video {
            return Err(PublishError::Unsupported(
                "YouTube only supports video content".to_string(),
            ));
        }
        let video_url = content
            .media_urls
            .first()
            .ok_or(PublishError::MissingMedia)?;

        let bytes = download(&self.http, video_url).await?;
        let location = self.upload_session(content, bytes.len()).await?;
        debug!(size = bytes.len(), "uploading video bytes");

        let token = self.access_token.read().await.clone();
        let response = self
            .http
            .put(&location)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "video/*")
            .body(bytes)
            .send()
            .await?;
        let video: VideoResource = handle_response(response).await?;

        Ok(PublishedPost {
            post_url: Some(format!("https://www.youtube.com/watch?v={}", video.id)),
            post_id: video.id,
        })
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.access_token.is_empty()
    }

    fn name(&self) -> &str {
        "YouTube"
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }
}
