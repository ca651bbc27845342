use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::recognizer::{RecognitionError, SpeechRecognizer};
use crate::audio::{AudioError, AudioFile, AudioFormat};

/// Text produced from one unit of audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub text: String,
}

/// Classified transcription failure. Each variant has a stable [`code`].
///
/// [`code`]: TranscriptionError::code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptionError {
    /// Request rejected before the provider was called
    #[error("{0}")]
    InvalidFormat(String),

    #[error("Unable to understand audio")]
    NoSpeech,

    #[error("Service unavailable")]
    Unavailable(String),

    /// Anything else; the message is the underlying one, untouched
    #[error("{0}")]
    Unknown(String),
}

impl TranscriptionError {
    pub fn code(&self) -> &'static str {
        match self {
            TranscriptionError::InvalidFormat(_) => "invalid_format",
            TranscriptionError::NoSpeech => "no_speech",
            TranscriptionError::Unavailable(_) => "unavailable",
            TranscriptionError::Unknown(_) => "unknown",
        }
    }
}

impl From<RecognitionError> for TranscriptionError {
    fn from(e: RecognitionError) -> Self {
        match e {
            RecognitionError::NoSpeech => TranscriptionError::NoSpeech,
            RecognitionError::Unavailable(msg) => TranscriptionError::Unavailable(msg),
            RecognitionError::Failed(msg) => TranscriptionError::Unknown(msg),
        }
    }
}

pub type TranscriptionResult = Result<Transcript, TranscriptionError>;

/// Uniform front for a [`SpeechRecognizer`].
///
/// Validates the request, short-circuits silent audio, makes exactly one
/// provider call and classifies the outcome. Retrying is the caller's call.
pub struct Transcriber {
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl Transcriber {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn provider(&self) -> &str {
        self.recognizer.name()
    }

    pub async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> TranscriptionResult {
        check_format(&format)?;

        let clip = AudioFile::from_wav_bytes(audio)
            .map_err(|e: AudioError| TranscriptionError::InvalidFormat(e.to_string()))?;

        if clip.is_silent() {
            debug!(
                "Skipping recognizer for silent clip ({:.2}s)",
                clip.duration_seconds
            );
            return Err(TranscriptionError::NoSpeech);
        }

        debug!(
            "Sending {:.2}s of audio to {}",
            clip.duration_seconds,
            self.recognizer.name()
        );

        match self.recognizer.recognize(audio).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(TranscriptionError::NoSpeech);
                }
                info!("Transcribed {:.2}s of audio ({} chars)", clip.duration_seconds, text.len());
                Ok(Transcript {
                    text: text.to_string(),
                })
            }
            Err(e) => {
                warn!("Recognition failed via {}: {}", self.recognizer.name(), e);
                Err(e.into())
            }
        }
    }

    pub async fn transcribe_file(
        &self,
        path: impl AsRef<Path>,
        format: AudioFormat,
    ) -> TranscriptionResult {
        check_format(&format)?;

        let audio = tokio::fs::read(path.as_ref())
            .await
            .map_err(|e| TranscriptionError::Unknown(e.to_string()))?;

        self.transcribe(&audio, format).await
    }
}

fn check_format(format: &AudioFormat) -> Result<(), TranscriptionError> {
    if format.is_supported() {
        Ok(())
    } else {
        Err(TranscriptionError::InvalidFormat(format!(
            "Unsupported audio format '{}': audio must be a WAV file",
            format
        )))
    }
}
