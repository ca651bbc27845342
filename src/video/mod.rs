//! Sign-language clip concatenation
//!
//! `ConcatenationEngine` validates a `ClipManifest` against the
//! `ClipLibrary`, then decodes every clip through a `VideoCodec` into one
//! output file owned by the scratch space.

mod codec;
mod engine;
mod ffmpeg;
mod manifest;
mod mock;

pub use codec::{
    ClipInfo, CodecError, FrameDecoder, FrameEncoder, FrameRate, Geometry, VideoCodec, VideoFrame,
};
pub use engine::{AbortFlag, ConcatenationEngine, MergedVideo};
pub use ffmpeg::FfmpegCodec;
pub use manifest::{ClipLibrary, ClipManifest, ResolvedClip};
pub use mock::{MockClip, MockCodec, MockCodecStats};
