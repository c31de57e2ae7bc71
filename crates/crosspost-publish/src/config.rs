//! Per-platform publisher configuration.
//!
//! Each platform is configured from `{config_dir}/{platform}.json` when that
//! file exists, and from environment variables otherwise.

use std::path::{Path, PathBuf};

use crosspost_content::Platform;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::ConfigError;

/// Configuration for all publishers.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PublishersConfig {
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub tiktok: TikTokConfig,
    #[serde(default)]
    pub facebook: FacebookConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bearer_token: String,
    /// Override for the v2 API base URL.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Override for the media upload base URL.
    #[serde(default)]
    pub upload_base: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TikTokConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub access_token: String,
    /// Privacy level for new posts. Unaudited apps may only post `SELF_ONLY`.
    #[serde(default)]
    pub privacy_level: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FacebookConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// `private`, `unlisted` or `public`.
    #[serde(default)]
    pub privacy_status: Option<String>,
    #[serde(default)]
    pub upload_base: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
}

impl PublishersConfig {
    /// Load configuration from `config_dir`, falling back to the process environment.
    pub fn load(config_dir: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(config_dir, |key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the process environment.
    pub fn load_with<F>(config_dir: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            twitter: match read_file(config_dir, Platform::Twitter)? {
                Some(config) => config,
                None => TwitterConfig {
                    enabled: env_flag(&lookup, "TWITTER_ENABLED"),
                    bearer_token: env_string(&lookup, "TWITTER_BEARER_TOKEN"),
                    api_base: None,
                    upload_base: None,
                },
            },
            tiktok: match read_file(config_dir, Platform::TikTok)? {
                Some(config) => config,
                None => TikTokConfig {
                    enabled: env_flag(&lookup, "TIKTOK_ENABLED"),
                    access_token: env_string(&lookup, "TIKTOK_ACCESS_TOKEN"),
                    privacy_level: lookup("TIKTOK_PRIVACY_LEVEL"),
                    api_base: None,
                },
            },
            facebook: match read_file(config_dir, Platform::Facebook)? {
                Some(config) => config,
                None => FacebookConfig {
                    enabled: env_flag(&lookup, "FACEBOOK_ENABLED"),
                    access_token: env_string(&lookup, "FACEBOOK_ACCESS_TOKEN"),
                    page_id: env_string(&lookup, "FACEBOOK_PAGE_ID"),
                    api_base: None,
                },
            },
            youtube: match read_file(config_dir, Platform::YouTube)? {
                Some(config) => config,
                None => YouTubeConfig {
                    enabled: env_flag(&lookup, "YOUTUBE_ENABLED"),
                    access_token: env_string(&lookup, "YOUTUBE_ACCESS_TOKEN"),
                    refresh_token: env_string(&lookup, "YOUTUBE_REFRESH_TOKEN"),
                    client_id: env_string(&lookup, "YOUTUBE_CLIENT_ID"),
                    client_secret: env_string(&lookup, "YOUTUBE_CLIENT_SECRET"),
                    privacy_status: lookup("YOUTUBE_PRIVACY_STATUS"),
                    upload_base: None,
                    token_url: None,
                },
            },
        })
    }
}

/// Read `{dir}/{platform}.json`, returning `None` when no such file exists.
fn read_file<T: DeserializeOwned>(
    dir: Option<&Path>,
    platform: Platform,
) -> Result<Option<T>, ConfigError> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    let path: PathBuf = dir.join(format!("{}.json", platform));

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded publisher config file");
    Ok(Some(config))
}

fn env_string<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> String {
    lookup(key).unwrap_or_default()
}

/// Accepts `1`, `true`, `yes` and `on`, case-insensitively.
fn env_flag<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> bool {
    lookup(key).is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_fallback() {
        let config = PublishersConfig::load_with(
            None,
            env(&[
                ("TWITTER_ENABLED", "true"),
                ("TWITTER_BEARER_TOKEN", "tw"),
                ("FACEBOOK_ENABLED", "YES"),
                ("FACEBOOK_ACCESS_TOKEN", "fb"),
                ("FACEBOOK_PAGE_ID", "42"),
                ("YOUTUBE_ENABLED", "false"),
            ]),
        )
        .unwrap();

        assert!(config.twitter.enabled);
        assert_eq!(config.twitter.bearer_token, "tw");
        assert!(config.facebook.enabled);
        assert_eq!(config.facebook.page_id, "42");
        assert!(!config.tiktok.enabled);
        assert!(!config.youtube.enabled);
    }

    #[test]
    fn test_file_takes_precedence_over_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("twitter.json"),
            r#"{"enabled": true, "bearer_token": "from-file"}"#,
        )
        .unwrap();

        let config = PublishersConfig::load_with(
            Some(dir.path()),
            env(&[
                ("TWITTER_ENABLED", "false"),
                ("TWITTER_BEARER_TOKEN", "from-env"),
                ("TIKTOK_ENABLED", "1"),
                ("TIKTOK_ACCESS_TOKEN", "tt"),
            ]),
        )
        .unwrap();

        assert!(config.twitter.enabled);
        assert_eq!(config.twitter.bearer_token, "from-file");
        // No tiktok.json, so the environment applies
        assert!(config.tiktok.enabled);
        assert_eq!(config.tiktok.access_token, "tt");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("youtube.json"), "{not json").unwrap();

        let result = PublishersConfig::load_with(Some(dir.path()), env(&[]));
        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[test]
    fn test_empty_environment_disables_everything() {
        let config = PublishersConfig::load_with(None, env(&[])).unwrap();
        assert!(!config.twitter.enabled);
        assert!(!config.tiktok.enabled);
        assert!(!config.facebook.enabled);
        assert!(!config.youtube.enabled);
    }
}
