use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::LiveSessionConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub scratch: ScratchConfig,
    pub assets: AssetsConfig,
    pub live: LiveConfig,
    pub speech: SpeechConfig,
    pub translation: TranslationConfig,
    pub captions: CaptionsConfig,
    pub video: VideoConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    pub cors: CorsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "signbridge".to_string(),
            http: HttpConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    pub max_concurrent_requests: usize,
    /// Largest accepted request body (uploads included)
    pub max_upload_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            max_concurrent_requests: 256,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Empty or `*` allows any origin
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    pub root: PathBuf,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("signbridge"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding the sign-language clips
    pub clips_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            clips_dir: PathBuf::from("assets/clips"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub idle_timeout_secs: u64,
    pub max_sessions: usize,
    pub event_buffer: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        let defaults = LiveSessionConfig::default();
        Self {
            idle_timeout_secs: defaults.idle_timeout.as_secs(),
            max_sessions: defaults.max_sessions,
            event_buffer: defaults.channel_capacity,
        }
    }
}

impl LiveConfig {
    pub fn session_config(&self) -> LiveSessionConfig {
        LiveSessionConfig {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            max_sessions: self.max_sessions,
            channel_capacity: self.event_buffer,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "whisper-1".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5050".to_string(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptionsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5051/captions".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub encoder: String,
    pub max_concurrent_jobs: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            encoder: "libx264".to_string(),
            max_concurrent_jobs: 2,
        }
    }
}

impl Config {
    /// Built-in defaults, then `path` (optional, any extension the config
    /// crate knows), then `SIGNBRIDGE__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SIGNBRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}
