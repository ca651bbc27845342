use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::Response,
};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::scratch::ScratchGuard;
use crate::video::MergedVideo;

pub(crate) const MERGED_FILE_NAME: &str = "merged_asl.mp4";

const READ_CHUNK: usize = 64 * 1024;

/// Stream a merged video as a download.
///
/// The scratch guard travels inside the body stream, so the file is removed
/// once the body has been sent or the client has gone away.
pub(crate) async fn attachment(
    merged: MergedVideo,
    file_name: &str,
) -> Result<Response, PipelineError> {
    let guard = merged.into_guard();

    let file = File::open(guard.path())
        .await
        .map_err(|e| PipelineError::Unknown(format!("Failed to open merged video: {}", e)))?;
    let length = file.metadata().await.ok().map(|m| m.len());

    let stream = futures::stream::unfold(Some((file, guard)), |state| async move {
        let (mut file, guard) = state?;
        let mut buf = vec![0u8; READ_CHUNK];

        match file.read(&mut buf).await {
            Ok(0) => {
                drop(file);
                finish(guard);
                None
            }
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Bytes::from(buf)), Some((file, guard))))
            }
            // The guard drops with the state
            Err(e) => Some((Err(e), None)),
        }
    });

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        );
    if let Some(length) = length {
        response = response.header(header::CONTENT_LENGTH, length);
    }

    response
        .body(Body::from_stream(stream))
        .map_err(|e| PipelineError::Unknown(e.to_string()))
}

fn finish(guard: ScratchGuard) {
    let path = guard.path().display().to_string();
    match guard.release() {
        Ok(()) => debug!("Delivered and released {}", path),
        Err(e) => warn!("Delivered {} but cleanup failed: {}", path, e),
    }
}
