use anyhow::{Context, Result};
use clap::Parser;
use signbridge::{
    create_router, AppState, ClipLibrary, ConcatenationEngine, Config, FfmpegCodec,
    HttpCaptionSource, HttpSpeechRecognizer, HttpTranslator, RouterOptions, ScratchSpace,
    SessionRegistry, Transcriber, TranslationService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signbridge")]
#[command(about = "Speech, translation and sign-language video service")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/signbridge")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Scratch root: {}", cfg.scratch.root.display());
    info!("Clip library: {}", cfg.assets.clips_dir.display());

    let scratch = Arc::new(ScratchSpace::new(&cfg.scratch.root)?);
    let swept = scratch.sweep();
    if swept > 0 {
        info!("Removed {} scratch files left by a previous run", swept);
    }

    let recognizer = HttpSpeechRecognizer::new(
        &cfg.speech.base_url,
        cfg.speech.api_key.clone(),
        &cfg.speech.model,
        Duration::from_secs(cfg.speech.timeout_secs),
    )
    .context("speech recognizer")?;
    let transcriber = Arc::new(Transcriber::new(Arc::new(recognizer)));
    info!("Speech provider: {}", transcriber.provider());

    let translator = HttpTranslator::new(
        &cfg.translation.base_url,
        cfg.translation.api_key.clone(),
        Duration::from_secs(cfg.translation.timeout_secs),
    )
    .context("translator")?;
    let translator = Arc::new(TranslationService::new(Arc::new(translator)));

    let captions = HttpCaptionSource::new(
        &cfg.captions.base_url,
        Duration::from_secs(cfg.captions.timeout_secs),
    )
    .context("caption source")?;

    if !cfg.assets.clips_dir.is_dir() {
        warn!(
            "Clip directory {} does not exist; every clip request will 404",
            cfg.assets.clips_dir.display()
        );
    }
    let codec = FfmpegCodec::new(&cfg.video.ffmpeg, &cfg.video.ffprobe, &cfg.video.encoder);
    let engine = ConcatenationEngine::new(
        ClipLibrary::new(&cfg.assets.clips_dir),
        Arc::clone(&scratch),
        Arc::new(codec),
        cfg.video.max_concurrent_jobs,
    );

    let sessions = SessionRegistry::new(
        cfg.live.session_config(),
        Arc::clone(&transcriber),
        Arc::clone(&scratch),
    )
    .with_translator(Arc::clone(&translator));

    let state = AppState::new(
        scratch,
        transcriber,
        translator,
        sessions,
        Arc::new(engine),
        Arc::new(captions),
    );

    let options = RouterOptions {
        allowed_origins: cfg.service.cors.allowed_origins.clone(),
        max_concurrent_requests: cfg.service.http.max_concurrent_requests,
        max_upload_bytes: cfg.service.http.max_upload_bytes,
    };
    let app = create_router(state, &options);

    let address = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("HTTP server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
