use async_trait::async_trait;

/// Outcome classes a speech-to-text provider can report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("no recognizable speech")]
    NoSpeech,

    #[error("speech service unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// External speech-to-text capability
///
/// Implementations:
/// - `HttpSpeechRecognizer`: OpenAI-compatible transcription endpoint
/// - `MockRecognizer`: scripted responses for tests
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize speech in a complete PCM WAV file
    async fn recognize(&self, wav: &[u8]) -> Result<String, RecognitionError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
