//! HTTP publishers for each supported platform.

mod facebook;
mod tiktok;
mod twitter;
mod youtube;

pub use facebook::FacebookPublisher;
pub use tiktok::TikTokPublisher;
pub use twitter::TwitterPublisher;
pub use youtube::YouTubePublisher;

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::PublishError;

/// Build an HTTP client whose overall timeout matches the publisher's budget.
fn http_client(timeout: Duration) -> Result<Client, PublishError> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()?)
}

/// Turn a non-success response into `PublishError::Api`.
async fn check_status(response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PublishError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Check the status and parse the JSON body.
async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, PublishError> {
    let text = check_status(response).await?.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| PublishError::InvalidResponse(format!("malformed body: {}", e)))
}

/// Fetch a media file into memory.
async fn download(http: &Client, url: &str) -> Result<Vec<u8>, PublishError> {
    let response = check_status(http.get(url).send().await?).await?;
    Ok(response.bytes().await?.to_vec())
}
