use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::codec::{FrameDecoder, FrameEncoder, Geometry, VideoCodec};
use super::manifest::{ClipLibrary, ClipManifest, ResolvedClip};
use crate::error::PipelineError;
use crate::scratch::{ScratchGuard, ScratchKind, ScratchSpace};

/// Cooperative cancellation for a running job, checked between clips
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Completed concatenation output.
///
/// The file stays on disk for as long as this value (or the guard taken from
/// it) is alive.
#[derive(Debug)]
pub struct MergedVideo {
    pub output: ScratchGuard,
    pub geometry: Geometry,
    pub frame_count: u64,
    pub clip_count: usize,
}

impl MergedVideo {
    pub fn path(&self) -> &Path {
        self.output.path()
    }

    pub fn into_guard(self) -> ScratchGuard {
        self.output
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Validated,
    Decoding { clip: usize },
    Completed,
    Failed,
}

/// Working set of one concatenation: resolved clips, canonical geometry and
/// the output scratch entry
struct ConcatenationJob {
    id: String,
    clips: Vec<ResolvedClip>,
    geometry: Geometry,
    output: ScratchGuard,
    state: JobState,
}

impl ConcatenationJob {
    fn transition(&mut self, state: JobState) {
        debug!("Job {}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
    }
}

/// Stitches clips from a [`ClipLibrary`] into one video
pub struct ConcatenationEngine {
    library: ClipLibrary,
    scratch: Arc<ScratchSpace>,
    codec: Arc<dyn VideoCodec>,
    permits: Arc<Semaphore>,
}

impl ConcatenationEngine {
    pub fn new(
        library: ClipLibrary,
        scratch: Arc<ScratchSpace>,
        codec: Arc<dyn VideoCodec>,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            library,
            scratch,
            codec,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    pub async fn concatenate(&self, manifest: &ClipManifest) -> Result<MergedVideo, PipelineError> {
        self.concatenate_with(manifest, &AbortFlag::new()).await
    }

    /// Concatenate in manifest order.
    ///
    /// All clips are resolved and probed before anything is opened: a
    /// missing clip or a geometry mismatch fails the job without creating an
    /// output file. Clips must share the first clip's geometry; mismatches
    /// are rejected, never resampled.
    pub async fn concatenate_with(
        &self,
        manifest: &ClipManifest,
        abort: &AbortFlag,
    ) -> Result<MergedVideo, PipelineError> {
        let clips = self.library.resolve_all(manifest)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PipelineError::Unavailable("concatenation engine shut down".into()))?;

        let geometry = self.canonical_geometry(&clips).await?;

        let job_id = format!("merge-{}", uuid::Uuid::new_v4());
        let output = self
            .scratch
            .allocate_guard(ScratchKind::MergedVideo, &job_id, "mp4")?;

        let mut job = ConcatenationJob {
            id: job_id,
            clips,
            geometry,
            output,
            state: JobState::Validated,
        };

        info!(
            "Job {}: merging {} clips at {}",
            job.id,
            job.clips.len(),
            job.geometry
        );

        match self.run(&mut job, abort).await {
            Ok(frame_count) => {
                job.transition(JobState::Completed);
                info!("Job {}: wrote {} frames", job.id, frame_count);
                Ok(MergedVideo {
                    clip_count: job.clips.len(),
                    output: job.output,
                    geometry: job.geometry,
                    frame_count,
                })
            }
            Err(e) => {
                job.transition(JobState::Failed);
                error!("Job {} failed: {}", job.id, e);
                // Dropping the job releases the partial output
                Err(e)
            }
        }
    }

    async fn canonical_geometry(&self, clips: &[ResolvedClip]) -> Result<Geometry, PipelineError> {
        let mut canonical: Option<Geometry> = None;

        for clip in clips {
            let info = self.codec.probe(&clip.path).await?;
            match canonical {
                None => canonical = Some(info.geometry),
                Some(expected) if expected != info.geometry => {
                    return Err(PipelineError::Validation(format!(
                        "Video {} is {} but the first clip is {}; clips must share one geometry",
                        clip.id, info.geometry, expected
                    )));
                }
                Some(_) => {}
            }
        }

        canonical.ok_or_else(|| PipelineError::Validation("No video names provided".into()))
    }

    async fn run(
        &self,
        job: &mut ConcatenationJob,
        abort: &AbortFlag,
    ) -> Result<u64, PipelineError> {
        let mut encoder = self
            .codec
            .open_encoder(job.output.path(), job.geometry)
            .await?;

        for index in 0..job.clips.len() {
            if abort.is_aborted() {
                encoder.abort().await;
                return Err(PipelineError::Unknown(format!(
                    "Job {} aborted before clip {}",
                    job.id, index
                )));
            }

            job.transition(JobState::Decoding { clip: index });

            let copied = self
                .copy_clip(&job.clips[index], job.geometry, encoder.as_mut())
                .await;
            if let Err(e) = copied {
                encoder.abort().await;
                return Err(e);
            }
        }

        Ok(encoder.finish().await?)
    }

    /// Decode one clip into the encoder; the decoder is closed exactly once
    /// whatever happens
    async fn copy_clip(
        &self,
        clip: &ResolvedClip,
        geometry: Geometry,
        encoder: &mut dyn FrameEncoder,
    ) -> Result<(), PipelineError> {
        let mut decoder = self.codec.open_decoder(&clip.path, geometry).await?;

        let copied = pump(decoder.as_mut(), encoder).await;
        let closed = decoder.close().await;

        let frames = copied?;
        if let Err(e) = closed {
            warn!("Closing decoder for {} failed: {}", clip.id, e);
            return Err(e.into());
        }

        debug!("Copied {} frames from {}", frames, clip.id);
        Ok(())
    }
}

async fn pump(
    decoder: &mut dyn FrameDecoder,
    encoder: &mut dyn FrameEncoder,
) -> Result<u64, PipelineError> {
    let mut frames = 0;
    while let Some(frame) = decoder.next_frame().await? {
        encoder.write_frame(&frame).await?;
        frames += 1;
    }
    Ok(frames)
}
