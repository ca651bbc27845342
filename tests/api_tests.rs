// Integration tests for the HTTP API
//
// The router is driven in-process with `tower::ServiceExt::oneshot`; every
// external capability is a mock.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use signbridge::captions::MockCaptionSource;
use signbridge::http::{create_router, AppState, RouterOptions};
use signbridge::scratch::{ScratchKind, ScratchSpace};
use signbridge::session::{LiveSessionConfig, SessionRegistry};
use signbridge::speech::{MockRecognizer, Transcriber};
use signbridge::translation::{MockTranslator, TranslationService};
use signbridge::video::{ClipLibrary, ConcatenationEngine, MockClip, MockCodec};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _temp_dir: TempDir,
    scratch: Arc<ScratchSpace>,
    router: Router,
}

fn test_app() -> Result<TestApp> {
    let temp_dir = TempDir::new()?;
    let clips_dir = temp_dir.path().join("clips");
    std::fs::create_dir_all(&clips_dir)?;
    MockClip::new("hello", 2).write(clips_dir.join("hello.mp4"))?;
    MockClip::new("world", 1).write(clips_dir.join("world.mp4"))?;

    let scratch = Arc::new(ScratchSpace::new(temp_dir.path().join("scratch"))?);
    let transcriber = Arc::new(Transcriber::new(Arc::new(MockRecognizer::fixed(
        "hello world",
    ))));
    let translator = Arc::new(TranslationService::new(Arc::new(MockTranslator::new())));
    let sessions = SessionRegistry::new(
        LiveSessionConfig::default(),
        Arc::clone(&transcriber),
        Arc::clone(&scratch),
    );
    let engine = ConcatenationEngine::new(
        ClipLibrary::new(&clips_dir),
        Arc::clone(&scratch),
        Arc::new(MockCodec::new()),
        2,
    );
    let captions = MockCaptionSource::new().with_transcript("abc123", &["line one", "line two"]);

    let state = AppState::new(
        Arc::clone(&scratch),
        transcriber,
        translator,
        sessions,
        Arc::new(engine),
        Arc::new(captions),
    );

    Ok(TestApp {
        _temp_dir: temp_dir,
        scratch,
        router: create_router(state, &RouterOptions::default()),
    })
}

fn wav_bytes() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..1600 {
            writer.write_sample(if i % 2 == 0 { 8000i16 } else { -8000 }).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn multipart_upload(file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "signbridge-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let app = test_app()?;

    let response = app.router.oneshot(get("/health")).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], b"OK");

    Ok(())
}

#[tokio::test]
async fn test_upload_transcribes_wav() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .oneshot(multipart_upload("speech.wav", "audio/wav", &wav_bytes()))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?, json!({ "text": "hello world" }));
    assert_eq!(app.scratch.live_count(), 0, "Upload scratch file is released");

    Ok(())
}

#[tokio::test]
async fn test_upload_rejects_other_formats() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .oneshot(multipart_upload("speech.mp3", "audio/mpeg", b"ID3 not a wav"))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await?;
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["error"], "You must upload your audio file as a WAV file.");

    Ok(())
}

#[tokio::test]
async fn test_translate_route() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/transcribe",
            json!({ "text": "hello", "target": "Hindi" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await?,
        json!({ "message": "[hi] hello", "target": "hi" })
    );

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["error"], "Request must be JSON");

    Ok(())
}

#[tokio::test]
async fn test_generate_captions() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/generate-captions",
            json!({ "youtube_url": "https://www.youtube.com/watch?v=abc123&t=42" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await?,
        json!({ "captions": "line one\nline two" })
    );

    let response = app
        .router
        .oneshot(json_request(
            "/generate-captions",
            json!({ "youtube_url": "https://example.com/video" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["kind"], "validation");

    Ok(())
}

#[tokio::test]
async fn test_serves_clips() -> Result<()> {
    let app = test_app()?;

    let response = app.router.clone().oneshot(get("/video/hello.mp4")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");

    let response = app.router.oneshot(get("/video/nothere.mp4")).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await?,
        json!({
            "error": "Video file not found: nothere.mp4",
            "kind": "not_found",
            "clip": "nothere.mp4"
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_merge_streams_attachment_then_cleans_up() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .oneshot(json_request(
            "/api/merge-videos",
            json!({ "video_names": ["hello.mp4", "world.mp4"] }),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"merged_asl.mp4\""
    );

    // The output stays until the body has been read
    assert_eq!(app.scratch.live_count_of(ScratchKind::MergedVideo), 1);

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], b"hello:0\nhello:1\nworld:0\n");
    assert_eq!(app.scratch.live_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_dropped_merge_response_releases_output() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .oneshot(json_request("/api/merge-videos", json!({ "text": "hello world" })))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.scratch.live_count(), 1);

    drop(response);
    assert_eq!(app.scratch.live_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_merge_errors() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/api/merge-videos",
            json!({ "video_names": ["hello.mp4", "missing.mp4"] }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await?;
    assert_eq!(body["error"], "Video file not found: missing.mp4");
    assert_eq!(body["clip"], "missing.mp4");

    let response = app
        .router
        .clone()
        .oneshot(json_request("/api/merge-videos", json!({ "video_names": [] })))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["error"], "No video names provided");

    let response = app
        .router
        .oneshot(json_request("/api/merge-videos", json!({})))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.scratch.live_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_unknown_session_status() -> Result<()> {
    let app = test_app()?;

    let response = app.router.oneshot(get("/sessions/live-nope/status")).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await?["kind"], "not_found");

    Ok(())
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() -> Result<()> {
    let app = test_app()?;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await?;

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    Ok(())
}
