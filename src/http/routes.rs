use super::state::{AppState, RouterOptions};
use super::{handlers, live};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, options: &RouterOptions) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Speech
        .route("/upload", post(handlers::upload))
        .route("/live", get(live::live_socket))
        .route("/sessions/:session_id/status", get(handlers::session_status))
        // Text
        .route("/transcribe", post(handlers::translate))
        .route("/generate-captions", post(handlers::generate_captions))
        // Sign-language video
        .route("/video/:filename", get(handlers::get_clip))
        .route("/api/merge-videos", post(handlers::merge_videos))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(GlobalConcurrencyLimitLayer::new(options.max_concurrent_requests.max(1)))
        .layer(cors_layer(&options.allowed_origins))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
