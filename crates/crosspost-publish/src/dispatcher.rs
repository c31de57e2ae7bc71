//! Concurrent fan-out of one piece of content to many platforms.

use std::sync::Arc;

use crosspost_content::{ContentAdapter, Platform, PublishResult, RawContent};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{DispatchError, PublisherRegistry};

/// Failure message for platforms without an enabled publisher.
pub const PLATFORM_UNAVAILABLE: &str = "platform unavailable";

/// Publishes content to a set of platforms concurrently.
///
/// Every requested platform yields exactly one `PublishResult`, whether the
/// publisher succeeds, fails, times out or panics.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<PublisherRegistry>,
    adapter: Arc<ContentAdapter>,
}

impl Dispatcher {
    pub fn new(registry: PublisherRegistry, adapter: ContentAdapter) -> Self {
        Self {
            registry: Arc::new(registry),
            adapter: Arc::new(adapter),
        }
    }

    pub fn registry(&self) -> &PublisherRegistry {
        &self.registry
    }

    pub fn adapter(&self) -> &ContentAdapter {
        &self.adapter
    }

    /// Publish `content` to each of `platforms` and collect every outcome.
    ///
    /// Duplicate platforms are published once. Results follow the order in
    /// which platforms first appear in the request.
    #[tracing::instrument(skip(self, content), fields(source_id = %content.source_id))]
    pub async fn publish_now(
        &self,
        content: RawContent,
        platforms: &[Platform],
    ) -> Result<Vec<PublishResult>, DispatchError> {
        let platforms = dedup_platforms(platforms);
        if platforms.is_empty() {
            return Err(DispatchError::Validation(
                "at least one platform is required".to_string(),
            ));
        }

        let content = Arc::new(content);
        let handles: Vec<(Platform, JoinHandle<PublishResult>)> = platforms
            .into_iter()
            .map(|platform| {
                let registry = Arc::clone(&self.registry);
                let adapter = Arc::clone(&self.adapter);
                let content = Arc::clone(&content);
                let handle = tokio::spawn(async move {
                    publish_to(&registry, &adapter, &content, platform).await
                });
                (platform, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (platform, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(%platform, error = %e, "publish task failed");
                    PublishResult::failed(platform, format!("publish task failed: {}", e))
                }
            };
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "dispatch complete"
        );
        Ok(results)
    }
}

/// Adapt and publish to one platform, turning every failure into a result.
async fn publish_to(
    registry: &PublisherRegistry,
    adapter: &ContentAdapter,
    content: &RawContent,
    platform: Platform,
) -> PublishResult {
    let Some(publisher) = registry.available(platform) else {
        warn!(%platform, "no enabled publisher");
        return PublishResult::failed(platform, PLATFORM_UNAVAILABLE);
    };

    let processed = match adapter.process(content, platform) {
        Ok(processed) => processed,
        Err(e) => {
            warn!(%platform, error = %e, "content adaptation failed");
            return PublishResult::failed(platform, format!("adaptation failed: {}", e));
        }
    };

    let timeout = publisher.timeout();
    match tokio::time::timeout(timeout, publisher.publish(&processed)).await {
        Ok(Ok(post)) => {
            info!(%platform, post_id = %post.post_id, "published");
            PublishResult::succeeded(platform, post.post_id, post.post_url)
        }
        Ok(Err(e)) => {
            error!(%platform, publisher = publisher.name(), error = %e, "publish failed");
            PublishResult::failed(platform, e.to_string())
        }
        Err(_) => {
            error!(%platform, timeout_secs = timeout.as_secs(), "publish timed out");
            PublishResult::failed(
                platform,
                format!("publish timed out after {}s", timeout.as_secs()),
            )
        }
    }
}

/// Drop repeated platforms, keeping first-occurrence order.
fn dedup_platforms(platforms: &[Platform]) -> Vec<Platform> {
    let mut unique = Vec::with_capacity(platforms.len());
    for platform in platforms {
        if !unique.contains(platform) {
            unique.push(*platform);
        }
    }
    unique
}
