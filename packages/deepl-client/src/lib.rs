//! Minimal DeepL v2 `/translate` client.
//!
//! Only plain-text translation is supported. Batches are sent as one
//! form-encoded request with a repeated `text` field, and results are mapped
//! back onto the caller's input positions.
//!
//! # Example
//!
//! ```rust,ignore
//! use deepl_client::{DeepLClient, TargetLang};
//!
//! let client = DeepLClient::from_env()?;
//! let out = client
//!     .translate_batch(&["Pool".into(), "".into(), "Waterfront".into()], TargetLang::Es)
//!     .await?;
//! // out == [Some("Piscina"), Some(""), Some("Frente al mar")]
//! ```

pub mod error;

pub use error::{DeepLError, Result};

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Free-tier endpoint.
pub const DEFAULT_API_URL: &str = "https://api-free.deepl.com/v2/translate";

/// Languages this client translates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLang {
    Es,
    En,
}

impl TargetLang {
    /// DeepL's `target_lang` code.
    pub fn code(&self) -> &'static str {
        match self {
            TargetLang::Es => "ES",
            TargetLang::En => "EN",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[allow(dead_code)]
    #[serde(default)]
    detected_source_language: Option<String>,
    text: String,
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// DeepL API client.
#[derive(Clone)]
pub struct DeepLClient {
    http_client: Client,
    api_key: String,
    api_url: String,
}

impl DeepLClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Create from `DEEPL_API_KEY`, honouring `DEEPL_API_URL` when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DEEPL_API_KEY")
            .map_err(|_| DeepLError::Config("DEEPL_API_KEY not set".into()))?;
        let client = Self::new(api_key);
        Ok(match std::env::var("DEEPL_API_URL") {
            Ok(url) if !url.is_empty() => client.with_api_url(url),
            _ => client,
        })
    }

    /// Point at a different endpoint (paid tier, proxy, test server).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Translate one text. Blank input is returned as-is without a request.
    pub async fn translate(&self, text: &str, target: TargetLang) -> Result<Option<String>> {
        let mut out = self.translate_batch(&[text.to_string()], target).await?;
        Ok(out.pop().flatten())
    }

    /// Translate many texts in one request.
    ///
    /// The output has one entry per input. Blank inputs are echoed back and
    /// never sent; an entry is `None` when DeepL returned fewer translations
    /// than requested.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target: TargetLang,
    ) -> Result<Vec<Option<String>>> {
        let mut form: Vec<(&str, &str)> = texts
            .iter()
            .filter(|t| !is_blank(t))
            .map(|t| ("text", t.as_str()))
            .collect();

        if form.is_empty() {
            return Ok(texts.iter().cloned().map(Some).collect());
        }

        let sent = form.len();
        form.push(("target_lang", target.code()));

        let response = self
            .http_client
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("DeepL-Auth-Key {}", self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "DeepL request failed");
                DeepLError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, "DeepL API error");
            return Err(DeepLError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| DeepLError::Parse(e.to_string()))?;

        debug!(
            sent,
            received = body.translations.len(),
            target = target.code(),
            "DeepL batch translated"
        );

        let mut translated = body.translations.into_iter().map(|t| t.text);
        Ok(texts
            .iter()
            .map(|text| {
                if is_blank(text) {
                    Some(text.clone())
                } else {
                    translated.next().filter(|t| !t.is_empty())
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_codes() {
        assert_eq!(TargetLang::Es.code(), "ES");
        assert_eq!(TargetLang::En.code(), "EN");
    }

    #[tokio::test]
    async fn all_blank_batch_makes_no_request() {
        // Unroutable URL: any request would fail with a network error.
        let client = DeepLClient::new("key").with_api_url("http://127.0.0.1:1/v2/translate");
        let out = client
            .translate_batch(&["".into(), "   ".into()], TargetLang::Es)
            .await
            .unwrap();
        assert_eq!(out, vec![Some("".to_string()), Some("   ".to_string())]);
    }
}
