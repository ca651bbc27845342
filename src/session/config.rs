use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits applied to every live audio session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSessionConfig {
    /// Close a session after this long without a chunk
    /// Default: 60 seconds
    pub idle_timeout: Duration,

    /// Maximum number of concurrently open sessions
    pub max_sessions: usize,

    /// Capacity of each session's inbound and outbound channels
    pub channel_capacity: usize,
}

impl Default for LiveSessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(60),
            max_sessions: 64,
            channel_capacity: 32,
        }
    }
}
