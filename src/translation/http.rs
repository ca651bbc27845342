use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::translator::{TranslationError, Translator};

/// LibreTranslate-compatible `POST {base_url}/translate` client
pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl HttpTranslator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::Failed(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        let url = format!("{}/translate", self.base_url);
        let body = TranslateRequest {
            q: text,
            source: "auto",
            target: target_code,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        tracing::debug!(target_code, "Sending text to translation endpoint");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    TranslationError::Unavailable(e.to_string())
                } else {
                    TranslationError::Failed(format!("request: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                TranslationError::Unavailable(format!("status {}: {}", status, body))
            } else {
                TranslationError::Failed(format!("status {}: {}", status, body))
            });
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Failed(format!("body: {}", e)))?;

        Ok(parsed.translated_text)
    }

    fn name(&self) -> &str {
        "http"
    }
}
