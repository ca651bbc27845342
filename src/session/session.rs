use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::LiveSessionConfig;
use super::stats::{CloseReason, SessionEvent, SessionState, SessionStats};
use crate::audio::AudioFormat;
use crate::error::{ErrorKind, PipelineError};
use crate::scratch::{ScratchError, ScratchGuard, ScratchKind, ScratchSpace};
use crate::speech::Transcriber;
use crate::translation::{TargetLanguage, TranslationService};

pub(crate) type SessionMap = Arc<RwLock<HashMap<String, Arc<Mutex<SessionStats>>>>>;

pub(crate) enum SessionCommand {
    Chunk(Vec<u8>),
    EncodedChunk(String),
    Configure(String),
    Invalid(String),
    End,
}

/// Sending half of a live session.
///
/// Dropping it is a disconnect: the session closes at once, abandoning
/// queued chunks and any in-flight transcription. Use [`SessionInput::end`]
/// for a graceful finish.
pub struct SessionInput {
    session_id: String,
    commands: mpsc::Sender<SessionCommand>,
    _disconnect: oneshot::Sender<()>,
}

impl SessionInput {
    pub(crate) fn new(
        session_id: String,
        commands: mpsc::Sender<SessionCommand>,
        disconnect: oneshot::Sender<()>,
    ) -> Self {
        Self {
            session_id,
            commands,
            _disconnect: disconnect,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Queue one WAV chunk for transcription
    pub async fn send_chunk(&self, audio: Vec<u8>) -> Result<(), PipelineError> {
        self.send(SessionCommand::Chunk(audio)).await
    }

    /// Queue one base64-encoded WAV chunk; decoding errors come back as an
    /// error event on this session
    pub async fn send_encoded_chunk(&self, data: String) -> Result<(), PipelineError> {
        self.send(SessionCommand::EncodedChunk(data)).await
    }

    /// Translate later transcripts to the language behind `label`
    pub async fn set_target(&self, label: String) -> Result<(), PipelineError> {
        self.send(SessionCommand::Configure(label)).await
    }

    /// Report a malformed client message on this session's channel
    pub async fn reject(&self, message: String) -> Result<(), PipelineError> {
        self.send(SessionCommand::Invalid(message)).await
    }

    /// Finish after everything already queued has been transcribed
    pub async fn end(&self) -> Result<(), PipelineError> {
        self.send(SessionCommand::End).await
    }

    async fn send(&self, command: SessionCommand) -> Result<(), PipelineError> {
        self.commands.send(command).await.map_err(|_| {
            PipelineError::Unavailable(format!("Session {} is closed", self.session_id))
        })
    }
}

/// Client-side view of one live session
pub struct LiveSessionHandle {
    input: SessionInput,
    events: mpsc::Receiver<SessionEvent>,
    task: JoinHandle<SessionStats>,
}

impl LiveSessionHandle {
    pub(crate) fn new(
        input: SessionInput,
        events: mpsc::Receiver<SessionEvent>,
        task: JoinHandle<SessionStats>,
    ) -> Self {
        Self {
            input,
            events,
            task,
        }
    }

    pub fn id(&self) -> &str {
        self.input.session_id()
    }

    pub fn input(&self) -> &SessionInput {
        &self.input
    }

    /// Next event for this session; `None` once the session has closed and
    /// every event was read
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// End gracefully and collect the events not read yet
    pub async fn finish(self) -> Result<(Vec<SessionEvent>, SessionStats), PipelineError> {
        let LiveSessionHandle {
            input,
            mut events,
            task,
        } = self;

        // Already closed sessions reject the command; draining still works
        let _ = input.end().await;

        let mut remaining = Vec::new();
        while let Some(event) = events.recv().await {
            remaining.push(event);
        }
        drop(input);

        let stats = task
            .await
            .map_err(|e| PipelineError::Unknown(format!("session task failed: {}", e)))?;
        Ok((remaining, stats))
    }

    /// Drop the connection without a graceful end
    pub async fn disconnect(self) -> Result<SessionStats, PipelineError> {
        let LiveSessionHandle {
            input,
            events,
            task,
        } = self;
        drop(input);
        drop(events);

        task.await
            .map_err(|e| PipelineError::Unknown(format!("session task failed: {}", e)))
    }

    pub fn into_parts(
        self,
    ) -> (
        SessionInput,
        mpsc::Receiver<SessionEvent>,
        JoinHandle<SessionStats>,
    ) {
        (self.input, self.events, self.task)
    }
}

/// Worker owning one session's state. Chunks are handled strictly one at a
/// time, so results leave in the order chunks arrived.
///
/// Chunk policy: every chunk is treated as a complete utterance and
/// transcribed as soon as it arrives.
pub(crate) struct LiveSession {
    pub(crate) id: String,
    pub(crate) config: LiveSessionConfig,
    pub(crate) transcriber: Arc<Transcriber>,
    pub(crate) translator: Option<Arc<TranslationService>>,
    pub(crate) scratch: Arc<ScratchSpace>,
    pub(crate) stats: Arc<Mutex<SessionStats>>,
    pub(crate) sessions: SessionMap,
    pub(crate) commands: mpsc::Receiver<SessionCommand>,
    pub(crate) disconnect: oneshot::Receiver<()>,
    pub(crate) events: mpsc::Sender<SessionEvent>,
    pub(crate) audio_file: Option<ScratchGuard>,
    pub(crate) target: Option<TargetLanguage>,
    pub(crate) next_sequence: u64,
}

impl LiveSession {
    pub(crate) async fn run(mut self) -> SessionStats {
        info!("Live session {} opened", self.id);
        let reason = self.receive_loop().await;
        self.close(reason).await
    }

    async fn receive_loop(&mut self) -> CloseReason {
        loop {
            let idle = self.config.idle_timeout;
            let next = tokio::select! {
                biased;
                _ = &mut self.disconnect => return CloseReason::Disconnected,
                command = tokio::time::timeout(idle, self.commands.recv()) => command,
            };

            let command = match next {
                Err(_) => return CloseReason::IdleTimeout,
                Ok(None) => return CloseReason::Disconnected,
                Ok(Some(command)) => command,
            };

            self.update(|s| s.last_activity = Utc::now()).await;

            let outcome = match command {
                SessionCommand::Chunk(audio) => self.handle_chunk(audio).await,
                SessionCommand::EncodedChunk(data) => match BASE64.decode(data.trim()) {
                    Ok(audio) => self.handle_chunk(audio).await,
                    Err(e) => {
                        let sequence = self.begin_chunk().await;
                        self.emit_error(
                            Some(sequence),
                            ErrorKind::Validation,
                            format!("Invalid base64 audio chunk: {}", e),
                        )
                        .await
                    }
                },
                SessionCommand::Configure(label) => {
                    let target = TargetLanguage::from_label(&label);
                    debug!("Session {} now translating to {}", self.id, target.code());
                    self.target = Some(target);
                    Ok(())
                }
                SessionCommand::Invalid(message) => {
                    self.emit_error(None, ErrorKind::Validation, message).await
                }
                SessionCommand::End => return CloseReason::EndOfStream,
            };

            if let Err(reason) = outcome {
                return reason;
            }
        }
    }

    async fn handle_chunk(&mut self, audio: Vec<u8>) -> Result<(), CloseReason> {
        let sequence = self.begin_chunk().await;

        let path = match self.scratch_path() {
            Ok(path) => path,
            Err(e) => {
                self.emit_error(Some(sequence), ErrorKind::Unknown, e.to_string())
                    .await?;
                return Err(CloseReason::Failed);
            }
        };

        if let Err(e) = tokio::fs::write(&path, &audio).await {
            warn!("Session {}: cannot write scratch audio: {}", self.id, e);
            self.emit_error(Some(sequence), ErrorKind::Unknown, e.to_string())
                .await?;
            return Err(CloseReason::Failed);
        }

        self.update(|s| s.state = SessionState::Transcribing).await;

        let result = tokio::select! {
            biased;
            _ = &mut self.disconnect => return Err(CloseReason::Disconnected),
            result = self.transcriber.transcribe_file(&path, AudioFormat::Wav) => result,
        };

        self.update(|s| s.state = SessionState::Receiving).await;

        match result {
            Ok(transcript) => {
                let translation = self.translate(sequence, &transcript.text).await?;
                self.emit(SessionEvent::Transcription {
                    sequence,
                    text: transcript.text,
                    translation,
                })
                .await
            }
            Err(e) => {
                debug!("Session {} chunk {}: {} ({})", self.id, sequence, e, e.code());
                let kind = PipelineError::from(e.clone()).kind();
                self.emit_error(Some(sequence), kind, e.to_string()).await
            }
        }
    }

    /// Translation failures are reported but keep the transcript
    async fn translate(
        &mut self,
        sequence: u64,
        text: &str,
    ) -> Result<Option<String>, CloseReason> {
        let (translator, target) = match (&self.translator, self.target) {
            (Some(translator), Some(target)) => (Arc::clone(translator), target),
            _ => return Ok(None),
        };

        let result = tokio::select! {
            biased;
            _ = &mut self.disconnect => return Err(CloseReason::Disconnected),
            result = translator.translate_to(text, target) => result,
        };

        match result {
            Ok(translation) => Ok(Some(translation.text)),
            Err(e) => {
                let kind = PipelineError::from(e.clone()).kind();
                self.emit_error(Some(sequence), kind, e.to_string()).await?;
                Ok(None)
            }
        }
    }

    async fn begin_chunk(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.update(|s| {
            s.chunks_received += 1;
            s.state = SessionState::Receiving;
        })
        .await;
        sequence
    }

    /// The session's own scratch file, allocated on the first chunk
    fn scratch_path(&mut self) -> Result<PathBuf, ScratchError> {
        let guard = match self.audio_file.take() {
            Some(guard) => guard,
            None => {
                let guard = self
                    .scratch
                    .allocate_guard(ScratchKind::LiveAudio, &self.id, "wav")?;
                debug!("Session {} audio at {}", self.id, guard.path().display());
                guard
            }
        };

        let path = guard.path().to_path_buf();
        self.audio_file = Some(guard);
        Ok(path)
    }

    async fn emit(&mut self, event: SessionEvent) -> Result<(), CloseReason> {
        // Counted before sending so a reader never sees the event first
        let is_error = matches!(event, SessionEvent::Error { .. });
        self.update(|s| {
            if is_error {
                s.errors_emitted += 1;
            } else {
                s.transcripts_emitted += 1;
            }
        })
        .await;

        self.events
            .send(event)
            .await
            .map_err(|_| CloseReason::Disconnected)
    }

    async fn emit_error(
        &mut self,
        sequence: Option<u64>,
        kind: ErrorKind,
        error: String,
    ) -> Result<(), CloseReason> {
        self.emit(SessionEvent::Error {
            sequence,
            kind,
            error,
        })
        .await
    }

    async fn update(&self, f: impl FnOnce(&mut SessionStats)) {
        let mut stats = self.stats.lock().await;
        f(&mut *stats);
    }

    async fn close(mut self, reason: CloseReason) -> SessionStats {
        if let Some(guard) = self.audio_file.take() {
            if let Err(e) = guard.release() {
                warn!("Session {}: {}", self.id, e);
            }
        }

        self.sessions.write().await.remove(&self.id);

        let snapshot = {
            let mut stats = self.stats.lock().await;
            stats.state = SessionState::Closed;
            stats.close_reason = Some(reason);
            stats.clone()
        };

        // Best effort: the client may already be gone
        let _ = self.events.try_send(SessionEvent::Closed { reason });

        info!(
            "Live session {} closed ({:?}): {} chunks, {} transcripts, {} errors",
            self.id,
            reason,
            snapshot.chunks_received,
            snapshot.transcripts_emitted,
            snapshot.errors_emitted
        );

        snapshot
    }
}
