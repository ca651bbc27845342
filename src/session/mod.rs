//! Live audio sessions
//!
//! Each connected client gets its own `LiveSession` worker with:
//! - a private command channel and event channel
//! - its own scratch file for incoming audio
//! - ordered transcription of chunks (one chunk in flight at a time)
//! - idle timeout and disconnect handling
//!
//! `SessionRegistry` opens sessions and answers status queries.

mod config;
mod registry;
mod session;
mod stats;

pub use config::LiveSessionConfig;
pub use registry::SessionRegistry;
pub use session::{LiveSessionHandle, SessionInput};
pub use stats::{CloseReason, SessionEvent, SessionState, SessionStats};
