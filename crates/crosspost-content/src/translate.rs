//! Text translation collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RawContent, TranslateError};

/// Default Google Translate v2 endpoint.
const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Translates text between languages.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError>;
}

/// Translator that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, TranslateError> {
        Ok(text.to_string())
    }
}

/// Translator backed by the Google Translate v2 REST API.
pub struct GoogleTranslator {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleTranslator {
    /// Create a translator using the public Google endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, TranslateError> {
        Self::with_endpoint(GOOGLE_TRANSLATE_URL, api_key)
    }

    /// Create a translator against a custom endpoint.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, TranslateError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: [&'a str; 1],
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let request = TranslateRequest {
            q: [text],
            source: source_lang,
            target: target_lang,
            format: "text",
        };

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::InvalidResponse(format!(
                "request failed ({}): {}",
                status, body
            )));
        }

        let body: TranslateResponse = response.json().await?;
        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| TranslateError::InvalidResponse("no translation returned".to_string()))
    }
}

/// Translate the title and body of `content`, leaving everything else untouched.
pub async fn translate_content(
    translator: &dyn Translator,
    content: RawContent,
    source_lang: &str,
    target_lang: &str,
) -> Result<RawContent, TranslateError> {
    if source_lang == target_lang {
        return Ok(content);
    }

    let mut translated = content;
    if !translated.title.is_empty() {
        translated.title = translator
            .translate(&translated.title, source_lang, target_lang)
            .await?;
    }
    if !translated.body.is_empty() {
        translated.body = translator
            .translate(&translated.body, source_lang, target_lang)
            .await?;
    }

    debug!(
        source_id = %translated.source_id,
        source_lang, target_lang, "translated source content"
    );
    Ok(translated)
}
