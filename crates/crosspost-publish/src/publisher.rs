//! The publisher capability and its registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crosspost_content::{Platform, ProcessedContent};

use crate::PublishError;
use crate::config::PublishersConfig;
use crate::platforms::{FacebookPublisher, TikTokPublisher, TwitterPublisher, YouTubePublisher};

/// Identifiers of a post created on a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub post_id: String,
    pub post_url: Option<String>,
}

/// A destination platform that can receive adapted content.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish adapted content.
    async fn publish(&self, content: &ProcessedContent) -> Result<PublishedPost, PublishError>;

    /// Whether this publisher is configured and switched on.
    fn is_enabled(&self) -> bool;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Upper bound on a single publish call.
    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}

/// Publishers keyed by the platform they serve.
#[derive(Clone, Default)]
pub struct PublisherRegistry {
    publishers: HashMap<Platform, Arc<dyn Publisher>>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one HTTP publisher per platform.
    ///
    /// Disabled publishers are registered too, so callers can report them.
    pub fn from_config(config: &PublishersConfig) -> Result<Self, PublishError> {
        Ok(Self::new()
            .with(
                Platform::Twitter,
                TwitterPublisher::new(config.twitter.clone())?,
            )
            .with(Platform::TikTok, TikTokPublisher::new(config.tiktok.clone())?)
            .with(
                Platform::Facebook,
                FacebookPublisher::new(config.facebook.clone())?,
            )
            .with(
                Platform::YouTube,
                YouTubePublisher::new(config.youtube.clone())?,
            ))
    }

    /// Register `publisher` for `platform`, replacing any previous one.
    pub fn register(&mut self, platform: Platform, publisher: Arc<dyn Publisher>) {
        self.publishers.insert(platform, publisher);
    }

    /// Builder-style `register`.
    pub fn with(mut self, platform: Platform, publisher: impl Publisher + 'static) -> Self {
        self.register(platform, Arc::new(publisher));
        self
    }

    /// The publisher registered for `platform`, enabled or not.
    pub fn get(&self, platform: Platform) -> Option<Arc<dyn Publisher>> {
        self.publishers.get(&platform).cloned()
    }

    /// The publisher for `platform` if it exists and is enabled.
    pub fn available(&self, platform: Platform) -> Option<Arc<dyn Publisher>> {
        self.get(platform).filter(|p| p.is_enabled())
    }

    /// Platforms with an enabled publisher, in declaration order.
    pub fn enabled_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.available(*p).is_some())
            .collect()
    }
}
