use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;

use super::recognizer::{RecognitionError, SpeechRecognizer};

/// Speech recognizer backed by an OpenAI-compatible
/// `POST {base_url}/audio/transcriptions` endpoint
pub struct HttpSpeechRecognizer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpSpeechRecognizer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RecognitionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecognitionError::Failed(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn recognize(&self, wav: &[u8]) -> Result<String, RecognitionError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = multipart::Part::bytes(wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognitionError::Failed(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);

        tracing::debug!(model = %self.model, "Sending audio to speech endpoint");

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                RecognitionError::Unavailable(e.to_string())
            } else {
                RecognitionError::Failed(format!("request: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                RecognitionError::Unavailable(format!("status {}: {}", status, body))
            } else {
                RecognitionError::Failed(format!("status {}: {}", status, body))
            });
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| RecognitionError::Failed(format!("body: {}", e)))?;

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(RecognitionError::NoSpeech);
        }

        Ok(transcript.to_string())
    }

    fn name(&self) -> &str {
        "http"
    }
}
