//! HTTP API server
//!
//! - GET /health - Health check
//! - POST /upload - Transcribe an uploaded WAV file
//! - GET /live - WebSocket live transcription session
//! - GET /sessions/:id/status - Query a live session
//! - POST /transcribe - Translate text
//! - POST /generate-captions - Fetch captions of a hosted video
//! - GET /video/:filename - Serve one sign-language clip
//! - POST /api/merge-videos - Concatenate clips and download the result

mod delivery;
mod handlers;
mod live;
mod routes;
mod state;

pub use handlers::ErrorResponse;
pub use live::ClientMessage;
pub use routes::create_router;
pub use state::{AppState, RouterOptions};
