use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Where a live session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Connected, no audio yet
    Idle,
    /// Waiting for the next chunk
    Receiving,
    /// A chunk is with the recognizer
    Transcribing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Client sent an explicit end-of-stream
    EndOfStream,
    /// Client went away
    Disconnected,
    IdleTimeout,
    /// Scratch storage for the session could not be used
    Failed,
}

/// Snapshot of one live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub state: SessionState,

    /// When the client connected
    pub created_at: DateTime<Utc>,

    /// Last chunk or command received
    pub last_activity: DateTime<Utc>,

    /// Number of audio chunks received
    pub chunks_received: usize,

    /// Number of transcription events emitted
    pub transcripts_emitted: usize,

    /// Number of error events emitted
    pub errors_emitted: usize,

    pub close_reason: Option<CloseReason>,
}

impl SessionStats {
    pub(crate) fn new(session_id: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            state: SessionState::Idle,
            created_at: now,
            last_activity: now,
            chunks_received: 0,
            transcripts_emitted: 0,
            errors_emitted: 0,
            close_reason: None,
        }
    }
}

/// Event delivered on a session's own outbound channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// First event of every session
    Session { session_id: String },

    Transcription {
        /// Index of the chunk this text came from
        sequence: u64,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        translation: Option<String>,
    },

    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        sequence: Option<u64>,
        kind: ErrorKind,
        error: String,
    },

    Closed { reason: CloseReason },
}
