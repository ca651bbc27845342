use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::codec::{
    ClipInfo, CodecError, FrameDecoder, FrameEncoder, FrameRate, Geometry, VideoCodec, VideoFrame,
};

/// JSON description of a fake clip understood by [`MockCodec`].
///
/// Frame `i` of a clip decodes to the bytes `"<label>:<i>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockClip {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frames: u64,
    /// Decoding fails when this frame index is reached
    #[serde(default)]
    pub fail_at: Option<u64>,
}

impl MockClip {
    pub fn new(label: &str, frames: u64) -> Self {
        Self {
            label: label.to_string(),
            width: 64,
            height: 48,
            fps: 30,
            frames,
            fail_at: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn failing_at(mut self, frame: u64) -> Self {
        self.fail_at = Some(frame);
        self
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            width: self.width,
            height: self.height,
            frame_rate: FrameRate::per_second(self.fps),
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json)
    }
}

/// Open/close counters shared between a [`MockCodec`] and the test
#[derive(Debug, Default)]
pub struct MockCodecStats {
    pub probes: AtomicUsize,
    pub decoders_opened: AtomicUsize,
    pub decoders_closed: AtomicUsize,
    pub encoders_opened: AtomicUsize,
    pub encoders_finished: AtomicUsize,
    pub encoders_aborted: AtomicUsize,
}

impl MockCodecStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Codec over [`MockClip`] files. The encoder writes one line per frame.
#[derive(Debug, Clone, Default)]
pub struct MockCodec {
    stats: Arc<MockCodecStats>,
}

impl MockCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Arc<MockCodecStats> {
        Arc::clone(&self.stats)
    }
}

async fn read_clip(path: &Path) -> Result<MockClip, CodecError> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(|e| CodecError::decode(path, e.to_string()))
}

#[async_trait]
impl VideoCodec for MockCodec {
    async fn probe(&self, path: &Path) -> Result<ClipInfo, CodecError> {
        self.stats.probes.fetch_add(1, Ordering::SeqCst);
        let clip = read_clip(path).await?;
        Ok(ClipInfo {
            geometry: clip.geometry(),
        })
    }

    async fn open_decoder(
        &self,
        path: &Path,
        _geometry: Geometry,
    ) -> Result<Box<dyn FrameDecoder>, CodecError> {
        let clip = read_clip(path).await?;
        self.stats.decoders_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDecoder {
            path: path.to_path_buf(),
            clip,
            next: 0,
            stats: Arc::clone(&self.stats),
        }))
    }

    async fn open_encoder(
        &self,
        path: &Path,
        _geometry: Geometry,
    ) -> Result<Box<dyn FrameEncoder>, CodecError> {
        self.stats.encoders_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockEncoder {
            path: path.to_path_buf(),
            lines: Vec::new(),
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct MockDecoder {
    path: PathBuf,
    clip: MockClip,
    next: u64,
    stats: Arc<MockCodecStats>,
}

#[async_trait]
impl FrameDecoder for MockDecoder {
    async fn next_frame(&mut self) -> Result<Option<VideoFrame>, CodecError> {
        if self.clip.fail_at == Some(self.next) {
            return Err(CodecError::decode(&self.path, format!("corrupt frame {}", self.next)));
        }
        if self.next >= self.clip.frames {
            return Ok(None);
        }
        let data = format!("{}:{}", self.clip.label, self.next).into_bytes();
        self.next += 1;
        Ok(Some(VideoFrame { data }))
    }

    async fn close(self: Box<Self>) -> Result<(), CodecError> {
        self.stats.decoders_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockEncoder {
    path: PathBuf,
    lines: Vec<String>,
    stats: Arc<MockCodecStats>,
}

#[async_trait]
impl FrameEncoder for MockEncoder {
    async fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), CodecError> {
        self.lines.push(String::from_utf8_lossy(&frame.data).into_owned());
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<u64, CodecError> {
        let mut body = self.lines.join("\n");
        body.push('\n');
        tokio::fs::write(&self.path, body).await?;
        self.stats.encoders_finished.fetch_add(1, Ordering::SeqCst);
        Ok(self.lines.len() as u64)
    }

    async fn abort(self: Box<Self>) {
        self.stats.encoders_aborted.fetch_add(1, Ordering::SeqCst);
    }
}
