use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rational frame rate (e.g. 30000/1001)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn per_second(fps: u32) -> Self {
        Self { num: fps, den: 1 }
    }

    /// Parse `"30/1"` or `"25"`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim().parse().ok()?, d.trim().parse().ok()?),
            None => (s.parse().ok()?, 1),
        };
        if num == 0 || den == 0 {
            return None;
        }
        Some(Self { num, den })
    }

    fn reduced(&self) -> (u32, u32) {
        let g = gcd(self.num, self.den).max(1);
        (self.num / g, self.den / g)
    }
}

impl PartialEq for FrameRate {
    fn eq(&self, other: &Self) -> bool {
        self.reduced() == other.reduced()
    }
}

impl Eq for FrameRate {}

impl std::fmt::Display for FrameRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Frame size and rate shared by every clip in one output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
}

impl Geometry {
    /// Bytes in one packed RGB24 frame
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.frame_rate)
    }
}

/// What a probe learns about a clip without decoding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipInfo {
    pub geometry: Geometry,
}

/// One decoded frame (packed RGB24 for the ffmpeg codec)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The codec backend itself is missing or cannot be started
    #[error("video codec unavailable: {0}")]
    Unavailable(String),

    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn decode(path: &Path, message: impl Into<String>) -> Self {
        CodecError::Decode {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// External video codec capability
///
/// Implementations:
/// - `FfmpegCodec`: ffprobe/ffmpeg subprocesses
/// - `MockCodec`: JSON clip descriptions, for tests
#[async_trait]
pub trait VideoCodec: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ClipInfo, CodecError>;

    async fn open_decoder(
        &self,
        path: &Path,
        geometry: Geometry,
    ) -> Result<Box<dyn FrameDecoder>, CodecError>;

    async fn open_encoder(
        &self,
        path: &Path,
        geometry: Geometry,
    ) -> Result<Box<dyn FrameEncoder>, CodecError>;
}

/// Frame source for one clip. `close` consumes the decoder, so it runs once.
#[async_trait]
pub trait FrameDecoder: Send {
    /// `Ok(None)` at end of stream
    async fn next_frame(&mut self) -> Result<Option<VideoFrame>, CodecError>;

    async fn close(self: Box<Self>) -> Result<(), CodecError>;
}

/// Output sink. Exactly one of `finish` or `abort` ends its life.
#[async_trait]
pub trait FrameEncoder: Send {
    async fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), CodecError>;

    /// Flush and close the output; returns the number of frames written
    async fn finish(self: Box<Self>) -> Result<u64, CodecError>;

    /// Stop without producing a usable file
    async fn abort(self: Box<Self>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_parse() {
        assert_eq!(FrameRate::parse("30/1"), Some(FrameRate::per_second(30)));
        assert_eq!(FrameRate::parse("25"), Some(FrameRate::per_second(25)));
        assert_eq!(FrameRate::parse("0/0"), None);
        assert_eq!(FrameRate::parse("abc"), None);
    }

    #[test]
    fn test_frame_rate_compares_reduced() {
        assert_eq!(FrameRate::new(30000, 1000), FrameRate::per_second(30));
        assert_ne!(FrameRate::new(30000, 1001), FrameRate::per_second(30));
    }

    #[test]
    fn test_geometry_frame_len() {
        let g = Geometry {
            width: 4,
            height: 2,
            frame_rate: FrameRate::per_second(30),
        };
        assert_eq!(g.frame_len(), 24);
        assert_eq!(g.to_string(), "4x2@30/1");
    }
}
