pub mod file;
pub mod format;

pub use file::{AudioError, AudioFile, SILENCE_PEAK_THRESHOLD};
pub use format::AudioFormat;
