use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::debug;

use super::codec::{
    ClipInfo, CodecError, FrameDecoder, FrameEncoder, FrameRate, Geometry, VideoCodec, VideoFrame,
};

/// Codec backed by `ffprobe` and `ffmpeg` subprocesses exchanging raw RGB24
/// frames over pipes
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    encoder: String,
}

impl FfmpegCodec {
    pub fn new(
        ffmpeg: impl Into<PathBuf>,
        ffprobe: impl Into<PathBuf>,
        encoder: impl Into<String>,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            encoder: encoder.into(),
        }
    }

    /// Decode to packed RGB24 at exactly the probed size. Rotation metadata
    /// is ignored because ffprobe reports the coded size, not the displayed
    /// one.
    fn decoder_args(path: &Path, geometry: Geometry) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-noautorotate", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(path.as_os_str().to_owned());
        args.push("-vf".into());
        args.push(format!("scale={}:{}", geometry.width, geometry.height).into());
        args.extend(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"].map(OsString::from));
        args
    }

    fn encoder_args(&self, path: &Path, geometry: Geometry) -> Vec<OsString> {
        let size = format!("{}x{}", geometry.width, geometry.height);
        let rate = geometry.frame_rate.to_string();

        let mut args: Vec<OsString> = ["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"]
            .iter()
            .map(OsString::from)
            .collect();
        args.extend(["-s", size.as_str(), "-r", rate.as_str(), "-i", "-"].map(OsString::from));
        args.extend(["-c:v", self.encoder.as_str()].map(OsString::from));
        args.extend(["-pix_fmt", "yuv420p", "-movflags", "+faststart"].map(OsString::from));
        args.push(path.as_os_str().to_owned());
        args
    }

    fn spawn_error(program: &Path, e: std::io::Error) -> CodecError {
        if e.kind() == ErrorKind::NotFound {
            CodecError::Unavailable(format!(
                "{} not found, install with: apt install ffmpeg",
                program.display()
            ))
        } else {
            CodecError::Unavailable(format!("failed to run {}: {}", program.display(), e))
        }
    }
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe", "libx264")
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[async_trait]
impl VideoCodec for FfmpegCodec {
    async fn probe(&self, path: &Path) -> Result<ClipInfo, CodecError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,r_frame_rate",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Self::spawn_error(&self.ffprobe, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = format!("ffprobe failed: {}", stderr.trim());
            return Err(CodecError::decode(path, message));
        }

        let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| CodecError::decode(path, format!("unreadable ffprobe output: {}", e)))?;

        let stream = parsed
            .streams
            .into_iter()
            .next()
            .ok_or_else(|| CodecError::decode(path, "no video stream"))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(CodecError::decode(path, "missing frame size")),
        };

        let frame_rate = stream
            .r_frame_rate
            .as_deref()
            .and_then(FrameRate::parse)
            .ok_or_else(|| CodecError::decode(path, "missing frame rate"))?;

        Ok(ClipInfo {
            geometry: Geometry {
                width,
                height,
                frame_rate,
            },
        })
    }

    async fn open_decoder(
        &self,
        path: &Path,
        geometry: Geometry,
    ) -> Result<Box<dyn FrameDecoder>, CodecError> {
        let mut child = Command::new(&self.ffmpeg)
            .args(Self::decoder_args(path, geometry))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::spawn_error(&self.ffmpeg, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CodecError::decode(path, "decoder stdout not captured"))?;
        let stderr = collect_stderr(&mut child);

        debug!("Opened decoder for {}", path.display());

        Ok(Box::new(FfmpegDecoder {
            path: path.to_path_buf(),
            child,
            stdout,
            stderr,
            frame_len: geometry.frame_len(),
        }))
    }

    async fn open_encoder(
        &self,
        path: &Path,
        geometry: Geometry,
    ) -> Result<Box<dyn FrameEncoder>, CodecError> {
        let mut child = Command::new(&self.ffmpeg)
            .args(self.encoder_args(path, geometry))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::spawn_error(&self.ffmpeg, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CodecError::Encode("encoder stdin not captured".into()))?;
        let stderr = collect_stderr(&mut child);

        debug!("Opened encoder for {} at {}", path.display(), geometry);

        Ok(Box::new(FfmpegEncoder {
            child,
            stdin: Some(stdin),
            stderr,
            frame_len: geometry.frame_len(),
            frames: 0,
        }))
    }
}

/// Drain stderr in the background so a chatty child never blocks on a full pipe
fn collect_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        })
    })
}

async fn stderr_text(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(h) => h.await.unwrap_or_default().trim().to_string(),
        None => String::new(),
    }
}

/// Read exactly one frame; `Ok(false)` on a clean end of stream
async fn read_frame<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("truncated frame ({} of {} bytes)", filled, buf.len()),
            ));
        }
        filled += n;
    }
    Ok(true)
}

struct FfmpegDecoder {
    path: PathBuf,
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    frame_len: usize,
}

#[async_trait]
impl FrameDecoder for FfmpegDecoder {
    async fn next_frame(&mut self) -> Result<Option<VideoFrame>, CodecError> {
        let mut data = vec![0u8; self.frame_len];
        match read_frame(&mut self.stdout, &mut data).await {
            Ok(true) => Ok(Some(VideoFrame { data })),
            Ok(false) => Ok(None),
            Err(e) => Err(CodecError::decode(&self.path, e.to_string())),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), CodecError> {
        let FfmpegDecoder {
            path,
            mut child,
            stdout,
            stderr,
            ..
        } = *self;

        // Closing our end first lets an early-closed decoder exit on SIGPIPE
        drop(stdout);
        let status = child.wait().await?;
        let stderr = stderr_text(stderr).await;

        if status.success() {
            Ok(())
        } else {
            let message = format!("ffmpeg exited with {}: {}", status, stderr);
            Err(CodecError::decode(&path, message))
        }
    }
}

struct FfmpegEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    frame_len: usize,
    frames: u64,
}

#[async_trait]
impl FrameEncoder for FfmpegEncoder {
    async fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), CodecError> {
        if frame.data.len() != self.frame_len {
            return Err(CodecError::Encode(format!(
                "frame is {} bytes, expected {}",
                frame.data.len(),
                self.frame_len
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| CodecError::Encode("encoder input already closed".into()))?;
        stdin
            .write_all(&frame.data)
            .await
            .map_err(|e| CodecError::Encode(e.to_string()))?;

        self.frames += 1;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> Result<u64, CodecError> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin
                .shutdown()
                .await
                .map_err(|e| CodecError::Encode(e.to_string()))?;
        }

        let status = self.child.wait().await?;
        let stderr = stderr_text(self.stderr.take()).await;

        if status.success() {
            Ok(self.frames)
        } else {
            Err(CodecError::Encode(format!("ffmpeg exited with {}: {}", status, stderr)))
        }
    }

    async fn abort(mut self: Box<Self>) {
        self.stdin.take();
        if let Err(e) = self.child.kill().await {
            debug!("Encoder already gone on abort: {}", e);
        }
        let _ = stderr_text(self.stderr.take()).await;
    }
}
