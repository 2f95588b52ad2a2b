//! JSON-RPC envelopes shared by the HTTP and push transports.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Remote method names understood by the service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Start a single download
    #[serde(rename = "Service.Exec")]
    Exec,
    /// Start a playlist download
    #[serde(rename = "Service.ExecPlaylist")]
    ExecPlaylist,
    /// Stop a running download
    #[serde(rename = "Service.Kill")]
    Kill,
    /// Remove a download from the live set
    #[serde(rename = "Service.Clear")]
    Clear,
    /// Stop every running download
    #[serde(rename = "Service.KillAll")]
    KillAll,
    /// Request a snapshot of all known jobs (push channel)
    #[serde(rename = "Service.Running")]
    Running,
    /// Free disk space on the server
    #[serde(rename = "Service.FreeSpace")]
    FreeSpace,
    /// Available formats for a URL
    #[serde(rename = "Service.Formats")]
    Formats,
    /// Server-side download directory listing
    #[serde(rename = "Service.DirectoryTree")]
    DirectoryTree,
    /// Update the downloader executable on the server
    #[serde(rename = "Service.UpdateExecutable")]
    UpdateExecutable,
    /// Start a livestream capture
    #[serde(rename = "Service.ExecLivestream")]
    ExecLivestream,
    /// Progress of all monitored livestreams
    #[serde(rename = "Service.ProgressLivestream")]
    ProgressLivestream,
    /// Stop one livestream capture
    #[serde(rename = "Service.KillLivestream")]
    KillLivestream,
    /// Stop all livestream captures
    #[serde(rename = "Service.KillAllLivestream")]
    KillAllLivestream,
    /// Clear all completed jobs from the live set
    #[serde(rename = "Service.ClearCompleted")]
    ClearCompleted,
}

/// Outbound request envelope
///
/// `id` is assigned by the client's correlation counter, never by callers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Remote method to invoke
    pub method: Method,

    /// Positional, method-specific parameters
    pub params: Vec<serde_json::Value>,

    /// Correlation id (stringified counter value)
    pub id: String,
}

/// Inbound response envelope
///
/// A non-null `error` means failure and makes `result` meaningless. On the
/// HTTP transport `id` echoes the request id; on the push channel frames
/// arrive unsolicited and `id` carries no correlation meaning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
pub struct RpcResponse<T> {
    /// Decoded payload, meaningful only when `error` is null
    #[serde(default)]
    pub result: Option<T>,

    /// Numeric error code, null on success
    #[serde(default)]
    pub error: Option<i64>,

    /// Echoed request id, when present
    #[serde(default)]
    pub id: Option<String>,
}

impl<T> RpcResponse<T> {
    /// Convert the envelope into a `Result`, mapping a non-null error code
    /// to [`Error::Rpc`]
    pub fn into_result(self) -> Result<T> {
        if let Some(code) = self.error {
            return Err(Error::Rpc { code });
        }
        self.result
            .ok_or_else(|| Error::Other("RPC response carried neither result nor error".to_string()))
    }

    /// Check only the error code, discarding any payload
    ///
    /// Used for fire-and-forget operations whose `result` is informational.
    pub fn into_unit(self) -> Result<()> {
        match self.error {
            Some(code) => Err(Error::Rpc { code }),
            None => Ok(()),
        }
    }
}
