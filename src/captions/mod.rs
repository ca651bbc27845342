//! Caption retrieval for hosted videos
//!
//! The transcript itself comes from a third-party source behind
//! `CaptionSource`; this module only extracts the video id and joins the
//! returned snippets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptionError {
    #[error("Invalid or missing YouTube URL")]
    InvalidUrl,

    #[error("caption source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to fetch captions: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSnippet {
    pub text: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
}

#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionSnippet>, CaptionError>;
}

/// Pull the video id out of a watch URL (`...watch?v=<id>&...`) or a
/// `youtu.be/<id>` short link
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();

    let id = if let Some((_, rest)) = url.split_once("v=") {
        rest.split('&').next().unwrap_or_default()
    } else if let Some((_, rest)) = url.split_once("youtu.be/") {
        rest.split(['?', '&', '/']).next().unwrap_or_default()
    } else {
        return None;
    };

    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// One caption line per snippet
pub fn join_captions(snippets: &[CaptionSnippet]) -> String {
    snippets
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetch captions for `url` end to end
pub async fn fetch_captions(source: &dyn CaptionSource, url: &str) -> Result<String, CaptionError> {
    let video_id = extract_video_id(url).ok_or(CaptionError::InvalidUrl)?;
    tracing::info!("Fetching captions for video {}", video_id);
    let snippets = source.fetch(&video_id).await?;
    Ok(join_captions(&snippets))
}

/// Transcript service answering `GET {base_url}/{video_id}` with a JSON array
/// of snippets
pub struct HttpCaptionSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCaptionSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CaptionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CaptionError::Failed(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CaptionSource for HttpCaptionSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionSnippet>, CaptionError> {
        let url = format!("{}/{}", self.base_url, video_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                CaptionError::Unavailable(e.to_string())
            } else {
                CaptionError::Failed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::Failed(format!("status {}", status)));
        }

        response
            .json::<Vec<CaptionSnippet>>()
            .await
            .map_err(|e| CaptionError::Failed(e.to_string()))
    }
}

/// In-memory caption source for tests
#[derive(Debug, Clone, Default)]
pub struct MockCaptionSource {
    transcripts: HashMap<String, Vec<CaptionSnippet>>,
}

impl MockCaptionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(mut self, video_id: &str, lines: &[&str]) -> Self {
        let snippets = lines
            .iter()
            .enumerate()
            .map(|(i, text)| CaptionSnippet {
                text: text.to_string(),
                start: i as f64,
                duration: 1.0,
            })
            .collect();
        self.transcripts.insert(video_id.to_string(), snippets);
        self
    }
}

#[async_trait]
impl CaptionSource for MockCaptionSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionSnippet>, CaptionError> {
        self.transcripts
            .get(video_id)
            .cloned()
            .ok_or_else(|| CaptionError::Failed(format!("no transcript for {}", video_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123&t=42s").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_extract_from_short_link() {
        assert_eq!(
            extract_video_id("https://youtu.be/abc123?si=xyz").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_extract_rejects_missing_id() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(extract_video_id("https://example.com/video"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[tokio::test]
    async fn test_fetch_captions_joins_lines() {
        let source = MockCaptionSource::new().with_transcript("abc", &["hello", "world"]);
        let captions = fetch_captions(&source, "https://youtube.com/watch?v=abc")
            .await
            .unwrap();
        assert_eq!(captions, "hello\nworld");
    }

    #[tokio::test]
    async fn test_fetch_captions_invalid_url() {
        let source = MockCaptionSource::new();
        let result = fetch_captions(&source, "not a url").await;
        assert_eq!(result, Err(CaptionError::InvalidUrl));
    }
}
