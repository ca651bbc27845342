pub mod audio;
pub mod captions;
pub mod config;
pub mod error;
pub mod http;
pub mod scratch;
pub mod session;
pub mod speech;
pub mod translation;
pub mod video;

pub use audio::{AudioFile, AudioFormat};
pub use captions::{CaptionSource, HttpCaptionSource, MockCaptionSource};
pub use config::Config;
pub use error::{ErrorKind, PipelineError};
pub use http::{create_router, AppState, RouterOptions};
pub use scratch::{ScratchGuard, ScratchHandle, ScratchKind, ScratchSpace};
pub use session::{
    CloseReason, LiveSessionConfig, LiveSessionHandle, SessionEvent, SessionRegistry,
    SessionStats,
};
pub use speech::{HttpSpeechRecognizer, MockRecognizer, SpeechRecognizer, Transcriber};
pub use translation::{
    HttpTranslator, MockTranslator, TargetLanguage, TranslationService, Translator,
};
pub use video::{
    ClipLibrary, ClipManifest, ConcatenationEngine, FfmpegCodec, MergedVideo, MockCodec,
    VideoCodec,
};
