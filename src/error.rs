use serde::{Deserialize, Serialize};

use crate::captions::CaptionError;
use crate::scratch::ScratchError;
use crate::speech::TranscriptionError;
use crate::translation::TranslationError;
use crate::video::CodecError;

/// Caller-facing failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input shape or format; retrying the same request will not help
    Validation,
    /// An external capability could not be reached; transient
    Unavailable,
    /// A referenced clip or asset does not exist
    NotFound,
    /// Media could not be parsed or processed
    Decode,
    /// Audio was understood but contained no recognizable speech
    NoSpeech,
    /// Anything uncategorized
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Decode => "decode",
            ErrorKind::NoSpeech => "no_speech",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary error for every pipeline operation.
///
/// Component errors convert into this with a fixed [`ErrorKind`]; the HTTP
/// layer maps it to a response without looking further.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Video file not found: {clip}")]
    NotFound { clip: String },

    #[error("{0}")]
    Decode(String),

    #[error("Unable to understand audio")]
    NoSpeech,

    #[error("{0}")]
    Unknown(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Unavailable(_) => ErrorKind::Unavailable,
            PipelineError::NotFound { .. } => ErrorKind::NotFound,
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::NoSpeech => ErrorKind::NoSpeech,
            PipelineError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// The clip a `NotFound` error refers to
    pub fn clip(&self) -> Option<&str> {
        match self {
            PipelineError::NotFound { clip } => Some(clip),
            _ => None,
        }
    }
}

impl From<TranscriptionError> for PipelineError {
    fn from(e: TranscriptionError) -> Self {
        match e {
            TranscriptionError::InvalidFormat(msg) => PipelineError::Validation(msg),
            TranscriptionError::NoSpeech => PipelineError::NoSpeech,
            TranscriptionError::Unavailable(_) => PipelineError::Unavailable(e.to_string()),
            TranscriptionError::Unknown(msg) => PipelineError::Unknown(msg),
        }
    }
}

impl From<TranslationError> for PipelineError {
    fn from(e: TranslationError) -> Self {
        match e {
            TranslationError::EmptyText => PipelineError::Validation(e.to_string()),
            TranslationError::Unavailable(_) => PipelineError::Unavailable(e.to_string()),
            TranslationError::Failed(msg) => PipelineError::Unknown(msg),
        }
    }
}

impl From<CodecError> for PipelineError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Unavailable(_) => PipelineError::Unavailable(e.to_string()),
            CodecError::Decode { .. } | CodecError::Encode(_) => {
                PipelineError::Decode(e.to_string())
            }
            CodecError::Io(_) => PipelineError::Unknown(e.to_string()),
        }
    }
}

impl From<ScratchError> for PipelineError {
    fn from(e: ScratchError) -> Self {
        PipelineError::Unknown(e.to_string())
    }
}

impl From<CaptionError> for PipelineError {
    fn from(e: CaptionError) -> Self {
        match e {
            CaptionError::InvalidUrl => PipelineError::Validation(e.to_string()),
            CaptionError::Unavailable(_) => PipelineError::Unavailable(e.to_string()),
            CaptionError::Failed(_) => PipelineError::Unknown(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_errors_keep_their_kind() {
        let cases = [
            (TranscriptionError::InvalidFormat("mp3".into()), ErrorKind::Validation),
            (TranscriptionError::NoSpeech, ErrorKind::NoSpeech),
            (TranscriptionError::Unavailable("down".into()), ErrorKind::Unavailable),
            (TranscriptionError::Unknown("boom".into()), ErrorKind::Unknown),
        ];

        for (err, kind) in cases {
            assert_eq!(PipelineError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_unknown_message_is_verbatim() {
        let e: PipelineError = TranscriptionError::Unknown("disk on fire".into()).into();
        assert_eq!(e.to_string(), "disk on fire");
    }

    #[test]
    fn test_not_found_names_clip() {
        let e = PipelineError::NotFound {
            clip: "missing.mp4".into(),
        };
        assert_eq!(e.clip(), Some("missing.mp4"));
        assert!(e.to_string().contains("missing.mp4"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        assert_eq!(ErrorKind::NoSpeech.to_string(), "no_speech");
    }
}
