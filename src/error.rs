//! Error types for ytdlp-sync
//!
//! The crate surfaces every failure through a single [`Error`] enum:
//! transport failures (HTTP or WebSocket), JSON decode failures, and
//! protocol-level errors reported by the remote service via a non-null
//! `error` code in an RPC response.
//!
//! The library never retries on its own. Retry and backoff, if desired,
//! belong to the calling layer (a periodic poll is itself a retry loop).

use thiserror::Error;

/// Result type alias for ytdlp-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ytdlp-sync
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport failure (connection refused, timeout, bad status)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// WebSocket transport failure on the push channel
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization or deserialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote service answered with a non-null RPC error code
    #[error("RPC error code {code}")]
    Rpc {
        /// Numeric error code from the `error` field of the response
        code: i64,
    },

    /// The push channel has been shut down or its writer task has exited
    #[error("push channel closed")]
    ChannelClosed,

    /// An endpoint URL could not be parsed
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}
