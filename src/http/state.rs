use std::sync::Arc;

use crate::captions::CaptionSource;
use crate::scratch::ScratchSpace;
use crate::session::SessionRegistry;
use crate::speech::Transcriber;
use crate::translation::TranslationService;
use crate::video::ConcatenationEngine;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Owner of every temporary file the handlers create
    pub scratch: Arc<ScratchSpace>,

    pub transcriber: Arc<Transcriber>,

    pub translator: Arc<TranslationService>,

    /// Live WebSocket sessions (session id → worker)
    pub sessions: SessionRegistry,

    pub engine: Arc<ConcatenationEngine>,

    pub captions: Arc<dyn CaptionSource>,
}

impl AppState {
    pub fn new(
        scratch: Arc<ScratchSpace>,
        transcriber: Arc<Transcriber>,
        translator: Arc<TranslationService>,
        sessions: SessionRegistry,
        engine: Arc<ConcatenationEngine>,
        captions: Arc<dyn CaptionSource>,
    ) -> Self {
        Self {
            scratch,
            transcriber,
            translator,
            sessions,
            engine,
            captions,
        }
    }
}

/// Router-wide limits and CORS policy
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Empty or `*` allows any origin
    pub allowed_origins: Vec<String>,
    pub max_concurrent_requests: usize,
    pub max_upload_bytes: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_concurrent_requests: 256,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}
