//! RPC client implementation split into focused submodules.
//!
//! - [`wire`] - Request/response envelopes and remote method names
//! - [`command`] - Download command encoding (arg sanitizer, payload builder)
//! - [`push`] - Persistent WebSocket push channel
//!
//! [`RpcClient`] itself owns the correlation-id counter, the HTTP
//! request/response path, and (once connected) the push channel. Every
//! remote operation is one method; request/response operations resolve with
//! the decoded payload or fail on transport or protocol errors.

pub mod command;
pub mod push;
pub mod wire;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{LiveStreamProgress, MediaMetadata};

use command::{DownloadCommand, build_download_payload};
use push::{JobSnapshot, PushChannel};
use wire::{Method, RpcRequest, RpcResponse};

/// Header carrying the bearer credential on HTTP requests
const AUTH_HEADER: &str = "X-Authentication";

/// Client for the remote download service
///
/// Owns the correlation-id sequence exclusively: ids are a strictly
/// increasing counter, stringified, assigned at send time and never visible
/// to callers beforehand. The counter is shared between the HTTP path and
/// the push path, and advances exactly once per sent request, including
/// requests that come back with an error code.
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    seq: AtomicU64,
    push: Option<PushChannel>,
}

impl RpcClient {
    /// Create a client with only the HTTP request/response path.
    ///
    /// Push-channel operations ([`RpcClient::running`],
    /// [`RpcClient::subscribe_snapshots`]) fail with
    /// [`Error::ChannelClosed`] until [`RpcClient::connect`] is used
    /// instead.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.sync.request_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoints.rpc_url.clone(),
            token: config.token.clone(),
            seq: AtomicU64::new(0),
            push: None,
        })
    }

    /// Create a client and open the persistent push channel
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut client = Self::new(config)?;
        let push = PushChannel::connect(
            &config.endpoints.websocket_url,
            config.token.as_deref(),
            config.sync.snapshot_buffer,
        )
        .await?;
        client.push = Some(push);
        Ok(client)
    }

    /// Next correlation id; strictly increasing for the client's lifetime
    fn next_id(&self) -> String {
        self.seq.fetch_add(1, Ordering::SeqCst).to_string()
    }

    /// Send one request/response call and decode its payload
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        params: Vec<serde_json::Value>,
    ) -> Result<T> {
        self.send_http::<T>(method, params).await?.into_result()
    }

    /// Send one fire-and-forget call, checking only the error code
    async fn call_unit(&self, method: Method, params: Vec<serde_json::Value>) -> Result<()> {
        self.send_http::<serde_json::Value>(method, params)
            .await?
            .into_unit()
    }

    async fn send_http<T: DeserializeOwned>(
        &self,
        method: Method,
        params: Vec<serde_json::Value>,
    ) -> Result<RpcResponse<T>> {
        let req = RpcRequest {
            method,
            params,
            id: self.next_id(),
        };

        tracing::debug!(method = ?method, id = %req.id, "Sending RPC request");

        let mut http_req = self.http.post(&self.endpoint).json(&req);
        if let Some(token) = &self.token {
            http_req = http_req.header(AUTH_HEADER, token);
        }

        let response = http_req.send().await?.json::<RpcResponse<T>>().await?;
        Ok(response)
    }

    /// Start a download (single item or playlist).
    ///
    /// A command with an empty URL is a deliberate no-op: nothing is sent
    /// and `Ok(())` is returned.
    pub async fn download(&self, cmd: &DownloadCommand) -> Result<()> {
        if cmd.url.is_empty() {
            tracing::debug!("Skipping download command with empty URL");
            return Ok(());
        }

        let (method, payload) = build_download_payload(cmd);
        self.call_unit(method, vec![serde_json::to_value(payload)?])
            .await
    }

    /// Fetch the available formats for a URL.
    ///
    /// Returns `Ok(None)` without sending anything when the URL is empty.
    /// Like single-item downloads, the URL is truncated at the playlist
    /// marker so the server inspects one item.
    pub async fn formats(&self, url: &str) -> Result<Option<MediaMetadata>> {
        if url.is_empty() {
            return Ok(None);
        }

        let single = url.split("?list").next().unwrap_or_default();
        let metadata = self
            .call(Method::Formats, vec![json!({ "URL": single })])
            .await?;
        Ok(Some(metadata))
    }

    /// Request a fresh snapshot of all known jobs over the push channel.
    ///
    /// Fire-and-forget: the snapshot arrives asynchronously on the push
    /// channel's inbound stream, never as a synchronous response to this
    /// call. Subscribe with [`RpcClient::subscribe_snapshots`].
    pub fn running(&self) -> Result<()> {
        let push = self.push.as_ref().ok_or(Error::ChannelClosed)?;
        push.send(RpcRequest {
            method: Method::Running,
            params: vec![],
            id: self.next_id(),
        })
    }

    /// Subscribe to job snapshots delivered on the push channel
    pub fn subscribe_snapshots(&self) -> Result<tokio::sync::broadcast::Receiver<JobSnapshot>> {
        let push = self.push.as_ref().ok_or(Error::ChannelClosed)?;
        Ok(push.subscribe())
    }

    /// Stop a running download
    pub async fn kill(&self, id: &str) -> Result<()> {
        self.call_unit(Method::Kill, vec![json!(id)]).await
    }

    /// Remove a download from the live set
    pub async fn clear(&self, id: &str) -> Result<()> {
        self.call_unit(Method::Clear, vec![json!(id)]).await
    }

    /// Stop every running download
    pub async fn kill_all(&self) -> Result<()> {
        self.call_unit(Method::KillAll, vec![]).await
    }

    /// Free disk space on the server, in bytes
    pub async fn free_space(&self) -> Result<u64> {
        self.call(Method::FreeSpace, vec![]).await
    }

    /// Server-side listing of the download directory tree
    pub async fn directory_tree(&self) -> Result<Vec<String>> {
        self.call(Method::DirectoryTree, vec![]).await
    }

    /// Start capturing a livestream
    pub async fn exec_livestream(&self, url: &str) -> Result<()> {
        self.call_unit(Method::ExecLivestream, vec![json!({ "URL": url })])
            .await
    }

    /// Progress of all monitored livestreams
    pub async fn progress_livestream(&self) -> Result<LiveStreamProgress> {
        self.call(Method::ProgressLivestream, vec![]).await
    }

    /// Stop one livestream capture
    pub async fn kill_livestream(&self, url: &str) -> Result<()> {
        self.call_unit(Method::KillLivestream, vec![json!(url)])
            .await
    }

    /// Stop all livestream captures
    pub async fn kill_all_livestream(&self) -> Result<()> {
        self.call_unit(Method::KillAllLivestream, vec![]).await
    }

    /// Ask the server to update its downloader executable
    pub async fn update_executable(&self) -> Result<()> {
        self.call_unit(Method::UpdateExecutable, vec![]).await
    }

    /// Clear all completed jobs from the live set
    pub async fn clear_completed(&self) -> Result<()> {
        self.call_unit(Method::ClearCompleted, vec![]).await
    }

    /// Tear down the push channel, if one is open.
    ///
    /// Idempotent; HTTP operations remain usable afterwards.
    pub fn shutdown(&self) {
        if let Some(push) = &self.push {
            push.shutdown();
        }
    }
}
