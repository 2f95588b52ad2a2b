//! # ytdlp-sync
//!
//! Client-side synchronization library for remote media-download services.
//!
//! The remote service manages long-running jobs (media downloads,
//! livestream captures) and unbounded collections (archive, subscriptions).
//! This crate gives a UI everything it needs to observe and control them:
//!
//! - **Command encoding** - CLI-style argument strings become typed,
//!   wire-shaped request payloads
//! - **RPC transport** - one persistent WebSocket push channel plus an HTTP
//!   request/response channel, multiplexed over a single logical protocol
//!   with client-assigned correlation ids
//! - **State reconciliation** - full-replace job snapshots feed an
//!   always-current store with derived status views
//! - **Lifecycle notifications** - "job completed" and "job errored" fire
//!   exactly once per transition
//! - **Cursor pagination** - forward/backward navigation over collections
//!   with no total count
//!
//! ## Quick Start
//!
//! ```no_run
//! use ytdlp_sync::{Config, DownloadCommand, JobMonitor, RpcClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = Arc::new(RpcClient::connect(&config).await?);
//!
//!     // Sync job state and watch for lifecycle transitions
//!     let monitor = JobMonitor::new(config.sync.notification_buffer);
//!     monitor.start(client.subscribe_snapshots()?);
//!     monitor.start_requester(client.clone(), config.sync.poll_interval);
//!
//!     let mut notifications = monitor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = notifications.recv().await {
//!             println!("Notification: {:?}", event);
//!         }
//!     });
//!
//!     // Start a download
//!     client
//!         .download(&DownloadCommand {
//!             url: "https://media.example/watch?v=1".to_string(),
//!             raw_args: "-f best".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Background synchronization driver
pub mod monitor;
/// Lifecycle transition notifications
pub mod notifier;
/// Cursor-based pagination
pub mod pagination;
/// REST collection endpoints
pub mod rest;
/// RPC client (decomposed into focused submodules)
pub mod rpc;
/// Job state store
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, EndpointConfig, SyncConfig};
pub use error::{Error, Result};
pub use monitor::JobMonitor;
pub use notifier::{LifecycleEvent, LifecycleNotifier};
pub use pagination::{FetchKey, PageCursor, PageNavigator};
pub use rest::{ArchiveQuery, RestClient};
pub use rpc::RpcClient;
pub use rpc::command::{
    DownloadCommand, DownloadPayload, build_download_payload, extract_rename, sanitize_args,
};
pub use rpc::push::{JobSnapshot, PushChannel};
pub use rpc::wire::{Method, RpcRequest, RpcResponse};
pub use store::JobStateStore;
pub use types::{
    ArchiveEntry, ChannelDump, ChannelVideo, JobProgress, JobRecord, JobStatus,
    LiveStreamProgress, LiveStreamStatus, MediaFormat, MediaInfo, MediaMetadata, Page,
    Subscription,
};
