//! Speech-to-text adapter
//!
//! `Transcriber` wraps whichever `SpeechRecognizer` is configured and turns
//! raw audio into a `TranscriptionResult`.

mod http;
mod mock;
mod recognizer;
mod transcriber;

pub use http::HttpSpeechRecognizer;
pub use mock::MockRecognizer;
pub use recognizer::{RecognitionError, SpeechRecognizer};
pub use transcriber::{Transcriber, Transcript, TranscriptionError, TranscriptionResult};
