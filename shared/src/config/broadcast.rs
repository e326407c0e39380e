//! Real-time broadcast configuration

use serde::{Deserialize, Serialize};

/// Event hub and event-stream settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastConfig {
    /// Per-subscriber queue capacity; a subscriber whose queue is full is dropped
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    /// Interval between keep-alive comments on idle event streams, in seconds
    #[serde(default = "default_keep_alive_seconds")]
    pub keep_alive_seconds: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: default_subscriber_buffer(),
            keep_alive_seconds: default_keep_alive_seconds(),
        }
    }
}

fn default_subscriber_buffer() -> usize {
    64
}

fn default_keep_alive_seconds() -> u64 {
    15
}
