//! Configuration types for ytdlp-sync

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoint configuration for the three remote surfaces
///
/// Groups the URLs a client instance talks to: the HTTP JSON-RPC endpoint,
/// the WebSocket push endpoint, and the REST base URL for paginated
/// collections. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// HTTP JSON-RPC endpoint (default: "http://127.0.0.1:3033/rpc")
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// WebSocket push endpoint (default: "ws://127.0.0.1:3033/rpc/ws")
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,

    /// Base URL for REST collection endpoints (default: "http://127.0.0.1:3033/")
    ///
    /// `/archive` and `/subscriptions` are resolved against this URL, so it
    /// must end with a trailing slash for sub-path bases to join correctly.
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            websocket_url: default_websocket_url(),
            rest_base_url: default_rest_base_url(),
        }
    }
}

/// Synchronization behavior configuration
///
/// Groups settings for the push channel and the optional periodic refresh.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between periodic `running()` refresh requests (default: 1s)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Timeout for individual HTTP RPC requests (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Buffer size of the snapshot broadcast channel (default: 64)
    ///
    /// Slow subscribers that fall more than this many snapshots behind are
    /// lagged; since each snapshot is a full replacement, skipping ahead to
    /// the latest one loses nothing.
    #[serde(default = "default_snapshot_buffer")]
    pub snapshot_buffer: usize,

    /// Buffer size of the lifecycle notification broadcast channel (default: 256)
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            snapshot_buffer: default_snapshot_buffer(),
            notification_buffer: default_notification_buffer(),
        }
    }
}

/// Top-level client configuration
///
/// Works out of the box against a service on localhost with no token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoint URLs
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Bearer token sent as `X-Authentication` on HTTP requests and as a
    /// `token` query parameter on the WebSocket handshake (None = no auth)
    #[serde(default)]
    pub token: Option<String>,

    /// Synchronization behavior
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:3033/rpc".to_string()
}

fn default_websocket_url() -> String {
    "ws://127.0.0.1:3033/rpc/ws".to_string()
}

fn default_rest_base_url() -> String {
    "http://127.0.0.1:3033/".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_snapshot_buffer() -> usize {
    64
}

fn default_notification_buffer() -> usize {
    256
}
