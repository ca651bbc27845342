use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use super::config::LiveSessionConfig;
use super::session::{LiveSession, LiveSessionHandle, SessionInput, SessionMap};
use super::stats::{SessionEvent, SessionStats};
use crate::error::PipelineError;
use crate::scratch::ScratchSpace;
use crate::speech::Transcriber;
use crate::translation::TranslationService;

/// Opens live sessions and tracks the ones still running
#[derive(Clone)]
pub struct SessionRegistry {
    config: LiveSessionConfig,
    transcriber: Arc<Transcriber>,
    translator: Option<Arc<TranslationService>>,
    scratch: Arc<ScratchSpace>,
    sessions: SessionMap,
}

impl SessionRegistry {
    pub fn new(
        config: LiveSessionConfig,
        transcriber: Arc<Transcriber>,
        scratch: Arc<ScratchSpace>,
    ) -> Self {
        Self {
            config,
            transcriber,
            translator: None,
            scratch,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Enable per-session translation of transcripts
    pub fn with_translator(mut self, translator: Arc<TranslationService>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Open a new session. Its first event is always `Session`.
    pub async fn open(&self) -> Result<LiveSessionHandle, PipelineError> {
        let id = format!("live-{}", Uuid::new_v4());
        let stats = Arc::new(Mutex::new(SessionStats::new(id.clone())));

        {
            let mut sessions = self.sessions.write().await;
            if sessions.len() >= self.config.max_sessions {
                warn!(
                    "Rejecting live session: {} already open",
                    self.config.max_sessions
                );
                return Err(PipelineError::Unavailable(format!(
                    "Too many live sessions (limit {})",
                    self.config.max_sessions
                )));
            }
            sessions.insert(id.clone(), Arc::clone(&stats));
        }

        let capacity = self.config.channel_capacity.max(1);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (disconnect_tx, disconnect_rx) = oneshot::channel();

        // Fresh channel, cannot be full
        let _ = event_tx.try_send(SessionEvent::Session {
            session_id: id.clone(),
        });

        let session = LiveSession {
            id: id.clone(),
            config: self.config.clone(),
            transcriber: Arc::clone(&self.transcriber),
            translator: self.translator.clone(),
            scratch: Arc::clone(&self.scratch),
            stats,
            sessions: Arc::clone(&self.sessions),
            commands: command_rx,
            disconnect: disconnect_rx,
            events: event_tx,
            audio_file: None,
            target: None,
            next_sequence: 0,
        };

        let task = tokio::spawn(session.run());
        info!("Opened live session {}", id);

        let input = SessionInput::new(id, command_tx, disconnect_tx);
        Ok(LiveSessionHandle::new(input, event_rx, task))
    }

    /// Snapshot of a running session
    pub async fn stats(&self, session_id: &str) -> Option<SessionStats> {
        let stats = self.sessions.read().await.get(session_id).cloned()?;
        let snapshot = stats.lock().await.clone();
        Some(snapshot)
    }

    pub async fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
