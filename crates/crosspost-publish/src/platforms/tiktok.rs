//! TikTok publisher using the Content Posting API.

use std::time::Duration;

use async_trait::async_trait;
use crosspost_content::{ContentType, ProcessedContent};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{handle_response, http_client};
use crate::config::TikTokConfig;
use crate::{PublishError, PublishedPost, Publisher};

const API_BASE: &str = "https://open.tiktokapis.com";
const TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_PRIVACY_LEVEL: &str = "SELF_ONLY";

/// Publishes videos by asking TikTok to pull them from their public URL.
pub struct TikTokPublisher {
    http: Client,
    config: TikTokConfig,
    api_base: String,
}

impl TikTokPublisher {
    pub fn new(config: TikTokConfig) -> Result<Self, PublishError> {
        let api_base = config.api_base.clone().unwrap_or_else(|| API_BASE.to_string());
        Ok(Self {
            http: http_client(TIMEOUT)?,
            config,
            api_base,
        })
    }
}

#[derive(Serialize)]
struct InitRequest<'a> {
    post_info: PostInfo<'a>,
    source_info: SourceInfo<'a>,
}

#[derive(Serialize)]
struct PostInfo<'a> {
    title: &'a str,
    privacy_level: &'a str,
}

#[derive(Serialize)]
struct SourceInfo<'a> {
    source: &'static str,
    video_url: &'a str,
}

#[derive(Deserialize)]
struct InitResponse {
    #[serde(default)]
    data: Option<InitData>,
    #[serde(default)]
    error: Option<ApiStatus>,
}

#[derive(Deserialize)]
struct InitData {
    publish_id: String,
}

#[derive(Deserialize)]
struct ApiStatus {
    code: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl Publisher for TikTokPublisher {
    #[tracing::instrument(skip(self, content), fields(source_id = %content.source_id))]
    async fn publish(&self, content: &ProcessedContent) -> Result<PublishedPost, PublishError> {
        if !self.is_enabled() {
            return Err(PublishError::NotConfigured);
        }
        if content.content_type != ContentType::Video {
            return Err(PublishError::Unsupported(
                "TikTok only supports video content".to_string(),
            ));
        }
        let video_url = content
            .media_urls
            .first()
            .ok_or(PublishError::MissingMedia)?;

        let request = InitRequest {
            post_info: PostInfo {
                title: &content.description,
                privacy_level: self
                    .config
                    .privacy_level
                    .as_deref()
                    .unwrap_or(DEFAULT_PRIVACY_LEVEL),
            },
            source_info: SourceInfo {
                source: "PULL_FROM_URL",
                video_url,
            },
        };

        let response = self
            .http
            .post(format!("{}/v2/post/publish/video/init/", self.api_base))
            .bearer_auth(&self.config.access_token)
            .json(&request)
            .send()
            .await?;

        let body: InitResponse = handle_response(response).await?;
        if let Some(status) = body.error.filter(|e| e.code != "ok") {
            return Err(PublishError::InvalidResponse(format!(
                "{}: {}",
                status.code, status.message
            )));
        }

        let data = body
            .data
            .ok_or_else(|| PublishError::InvalidResponse("missing publish_id".to_string()))?;
        debug!(publish_id = %data.publish_id, "TikTok accepted video for processing");

        // TikTok assigns the public URL only after asynchronous processing
        Ok(PublishedPost {
            post_id: data.publish_id,
            post_url: None,
        })
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.access_token.is_empty()
    }

    fn name(&self) -> &str {
        "TikTok"
    }

    fn timeout(&self) -> Duration {
        TIMEOUT
    }
}
