use super::delivery;
use super::state::AppState;
use crate::audio::AudioFormat;
use crate::captions::{fetch_captions, CaptionError};
use crate::error::{ErrorKind, PipelineError};
use crate::scratch::ScratchKind;
use crate::video::ClipManifest;
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, Request, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,

    /// Language label such as "Arabic"; unknown labels mean English
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub message: String,
    /// Provider language code actually used
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct CaptionsRequest {
    pub youtube_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptionsResponse {
    pub captions: String,
}

/// Either an explicit clip list or a sentence turned into one clip per word
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub video_names: Option<Vec<String>>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NoSpeech | ErrorKind::Decode => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Unknown {
            error!("Request failed: {}", self);
        }

        (
            status_for(kind),
            Json(ErrorResponse {
                error: self.to_string(),
                kind,
                clip: self.clip().map(str::to_string),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /upload
/// Transcribe one uploaded WAV file (multipart field `file`)
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, PipelineError> {
    let mut multipart = multipart.map_err(|e| PipelineError::Validation(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PipelineError::Validation(e.body_text()))?;
        upload = Some((file_name, content_type, bytes));
        break;
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| PipelineError::Validation("No file part".to_string()))?;
    if file_name.is_empty() {
        return Err(PipelineError::Validation("No selected file".to_string()));
    }

    let format = match AudioFormat::from_filename(&file_name) {
        AudioFormat::Wav => AudioFormat::Wav,
        other => content_type
            .as_deref()
            .map(AudioFormat::from_content_type)
            .filter(AudioFormat::is_supported)
            .unwrap_or(other),
    };
    if !format.is_supported() {
        return Err(PipelineError::Validation(
            "You must upload your audio file as a WAV file.".to_string(),
        ));
    }

    info!("Received upload {} ({} bytes)", file_name, bytes.len());

    let saved = state
        .scratch
        .allocate_guard(ScratchKind::Upload, "upload", "wav")?;
    tokio::fs::write(saved.path(), &bytes)
        .await
        .map_err(|e| PipelineError::Unknown(format!("Failed to save upload: {}", e)))?;

    let result = state.transcriber.transcribe_file(saved.path(), format).await;

    if let Err(e) = saved.release() {
        warn!("Upload cleanup failed: {}", e);
    }

    let transcript = result?;
    Ok(Json(UploadResponse {
        text: transcript.text,
    }))
}

/// GET /sessions/:session_id/status
/// Snapshot of a running live session
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.sessions.stats(&session_id).await {
        Some(stats) => (StatusCode::OK, Json(stats)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
                kind: ErrorKind::NotFound,
                clip: None,
            }),
        )
            .into_response(),
    }
}

/// POST /transcribe
/// Translate text to the requested language
pub async fn translate(
    State(state): State<AppState>,
    request: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, PipelineError> {
    let Json(request) =
        request.map_err(|_| PipelineError::Validation("Request must be JSON".to_string()))?;

    let translation = state
        .translator
        .translate(&request.text, &request.target)
        .await?;

    Ok(Json(TranslateResponse {
        message: translation.text,
        target: translation.target.code().to_string(),
    }))
}

/// POST /generate-captions
/// Fetch and join the captions of a hosted video
pub async fn generate_captions(
    State(state): State<AppState>,
    request: Result<Json<CaptionsRequest>, JsonRejection>,
) -> Result<Json<CaptionsResponse>, PipelineError> {
    let url = request
        .ok()
        .and_then(|Json(request)| request.youtube_url)
        .ok_or(CaptionError::InvalidUrl)?;

    let captions = fetch_captions(state.captions.as_ref(), &url).await?;
    Ok(Json(CaptionsResponse { captions }))
}

/// GET /video/:filename
/// Serve one clip from the clip library
pub async fn get_clip(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, PipelineError> {
    let clip = state.engine.library().resolve(&filename)?;

    match ServeFile::new(&clip.path).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}

/// POST /api/merge-videos
/// Concatenate clips and stream the result as `merged_asl.mp4`
pub async fn merge_videos(
    State(state): State<AppState>,
    request: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Response, PipelineError> {
    let Json(request) =
        request.map_err(|_| PipelineError::Validation("Request must be JSON".to_string()))?;

    let manifest = match (request.video_names, request.text) {
        (Some(names), _) => ClipManifest::new(names)?,
        (None, Some(text)) => ClipManifest::from_sentence(&text)?,
        (None, None) => {
            return Err(PipelineError::Validation(
                "No video names provided".to_string(),
            ))
        }
    };

    info!("Merging {} clips", manifest.len());
    let merged = state.engine.concatenate(&manifest).await?;
    info!(
        "Merged {} clips into {} frames at {}",
        merged.clip_count, merged.frame_count, merged.geometry
    );

    delivery::attachment(merged, delivery::MERGED_FILE_NAME).await
}
