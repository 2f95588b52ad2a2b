//! Persistent WebSocket push channel.
//!
//! One long-lived connection carries both directions of the push protocol:
//! outbound frames are [`RpcRequest`]s (notably `Service.Running`), inbound
//! frames are unsolicited `RpcResponse<JobRecord[]>` snapshots. Frames are
//! uncorrelated: a request on this channel never expects a matching
//! response, and inbound snapshots replace, rather than answer, anything.
//!
//! Snapshots fan out to any number of subscribers through a broadcast
//! channel. Malformed job records are skipped individually so one bad
//! record never drops the rest of its snapshot.

use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result};
use crate::types::JobRecord;

use super::wire::{RpcRequest, RpcResponse};

/// A complete, authoritative listing of currently known jobs at one instant
pub type JobSnapshot = Vec<JobRecord>;

/// Handle to the persistent push connection
///
/// Cheap to share by reference; the connection itself lives in two spawned
/// tasks (writer and reader) that exit on [`PushChannel::shutdown`] or when
/// the transport closes.
pub struct PushChannel {
    outbound: mpsc::UnboundedSender<RpcRequest>,
    snapshots: broadcast::Sender<JobSnapshot>,
    cancel: CancellationToken,
}

impl PushChannel {
    /// Open the WebSocket connection and spawn the writer and reader tasks.
    ///
    /// The token, when present, is carried as a `token` query parameter on
    /// the handshake URL. `snapshot_buffer` bounds the broadcast channel;
    /// lagged subscribers skip to newer snapshots, which is lossless under
    /// full-replace semantics.
    pub async fn connect(
        ws_endpoint: &str,
        token: Option<&str>,
        snapshot_buffer: usize,
    ) -> Result<Self> {
        let url = build_ws_url(ws_endpoint, token)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (mut ws_sink, mut ws_source) = ws_stream.split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<RpcRequest>();
        let (snapshots, _) = broadcast::channel(snapshot_buffer.max(1));
        let cancel = CancellationToken::new();

        let writer_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_cancel.cancelled() => break,
                    req = outbound_rx.recv() => {
                        let Some(req) = req else { break };
                        let frame = match serde_json::to_string(&req) {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to encode outbound push frame");
                                continue;
                            }
                        };
                        if let Err(e) = ws_sink.send(Message::Text(frame)).await {
                            tracing::warn!(error = %e, "Push channel write failed, stopping writer");
                            break;
                        }
                    }
                }
            }
        });

        let reader_cancel = cancel.clone();
        let snapshot_tx = snapshots.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_cancel.cancelled() => break,
                    frame = ws_source.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(snapshot) = decode_snapshot(&text) {
                                    // Send fails only with zero subscribers; fine
                                    let _ = snapshot_tx.send(snapshot);
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::info!("Push channel closed by remote");
                                break;
                            }
                            Some(Ok(_)) => {} // ping/pong/binary frames carry no snapshots
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "Push channel read failed");
                                break;
                            }
                        }
                    }
                }
            }
        });

        tracing::debug!(endpoint = %url, "Push channel connected");

        Ok(Self {
            outbound,
            snapshots,
            cancel,
        })
    }

    /// Queue an outbound request frame.
    ///
    /// Fire-and-forget: delivery acknowledges nothing, and any effect shows
    /// up later as an unsolicited snapshot.
    pub fn send(&self, req: RpcRequest) -> Result<()> {
        self.outbound.send(req).map_err(|_| Error::ChannelClosed)
    }

    /// Subscribe to inbound job snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<JobSnapshot> {
        self.snapshots.subscribe()
    }

    /// Tear the connection down deterministically.
    ///
    /// After this returns, no further snapshots are delivered to
    /// subscribers and queued outbound frames are dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn build_ws_url(ws_endpoint: &str, token: Option<&str>) -> Result<Url> {
    let mut url =
        Url::parse(ws_endpoint).map_err(|_| Error::InvalidEndpoint(ws_endpoint.to_string()))?;
    if let Some(token) = token {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}

/// Decode one inbound frame into a snapshot.
///
/// Records are decoded individually: a malformed record is logged and
/// skipped, the rest of the snapshot still applies. Frames carrying an RPC
/// error code or a null result produce no snapshot.
fn decode_snapshot(text: &str) -> Option<JobSnapshot> {
    let response: RpcResponse<Vec<serde_json::Value>> = match serde_json::from_str(text) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding undecodable push frame");
            return None;
        }
    };

    if let Some(code) = response.error {
        tracing::warn!(code, "Push frame carried an RPC error, no snapshot applied");
        return None;
    }

    let raw_records = response.result?;
    let mut snapshot = Vec::with_capacity(raw_records.len());
    for raw in raw_records {
        match serde_json::from_value::<JobRecord>(raw) {
            Ok(record) => snapshot.push(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed job record in snapshot");
            }
        }
    }

    Some(snapshot)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::wire::Method;
    use std::time::Duration;

    const SNAPSHOT_FRAME: &str = r#"{
        "result": [
            {"id": "job-1", "progress": {"process_status": 1, "percentage": "10%", "speed": 100.0, "eta": 5.0}},
            {"id": "job-2", "progress": {"process_status": 2, "percentage": "100%", "speed": 0.0, "eta": 0.0}}
        ],
        "error": null
    }"#;

    // --- decode_snapshot ---

    #[test]
    fn decode_snapshot_yields_all_well_formed_records() {
        let snapshot = decode_snapshot(SNAPSHOT_FRAME).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "job-1");
        assert_eq!(snapshot[1].id, "job-2");
    }

    #[test]
    fn decode_snapshot_skips_malformed_records_individually() {
        let frame = r#"{
            "result": [
                {"id": "good", "progress": {"process_status": 0}},
                {"this_is": "not a job record"},
                {"id": "also-good", "progress": {"process_status": 1}}
            ],
            "error": null
        }"#;

        let snapshot = decode_snapshot(frame).unwrap();
        let ids: Vec<_> = snapshot.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["good", "also-good"],
            "one malformed record must not prevent the rest of the snapshot"
        );
    }

    #[test]
    fn decode_snapshot_rejects_error_frames() {
        assert!(
            decode_snapshot(r#"{"result": [], "error": 5}"#).is_none(),
            "an error frame must produce no snapshot at all"
        );
    }

    #[test]
    fn decode_snapshot_rejects_non_json_frames() {
        assert!(decode_snapshot("definitely not json").is_none());
    }

    #[test]
    fn decode_snapshot_of_empty_result_is_empty_but_valid() {
        let snapshot = decode_snapshot(r#"{"result": [], "error": null}"#).unwrap();
        assert!(
            snapshot.is_empty(),
            "an empty snapshot is authoritative: it clears the live set"
        );
    }

    // --- build_ws_url ---

    #[test]
    fn ws_url_carries_token_as_query_parameter() {
        let url = build_ws_url("ws://media.example/rpc/ws", Some("secret")).unwrap();
        assert_eq!(url.as_str(), "ws://media.example/rpc/ws?token=secret");
    }

    #[test]
    fn ws_url_without_token_is_untouched() {
        let url = build_ws_url("ws://media.example/rpc/ws", None).unwrap();
        assert_eq!(url.as_str(), "ws://media.example/rpc/ws");
    }

    #[test]
    fn ws_url_rejects_garbage_endpoints() {
        assert!(matches!(
            build_ws_url("not a url", None),
            Err(Error::InvalidEndpoint(_))
        ));
    }

    // --- live channel round trip against a local server ---

    #[tokio::test]
    async fn channel_sends_requests_and_delivers_snapshots() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            // First inbound frame must be the Running request
            let frame = ws.next().await.unwrap().unwrap();
            let req: RpcRequest = serde_json::from_str(&frame.into_text().unwrap()).unwrap();
            assert_eq!(req.method, Method::Running);

            // Deliver a snapshot, unsolicited-style
            ws.send(Message::Text(SNAPSHOT_FRAME.to_string()))
                .await
                .unwrap();
        });

        let channel = PushChannel::connect(&format!("ws://{addr}"), None, 8)
            .await
            .unwrap();
        let mut snapshots = channel.subscribe();

        channel
            .send(RpcRequest {
                method: Method::Running,
                params: vec![],
                id: "0".to_string(),
            })
            .unwrap();

        let snapshot = tokio::time::timeout(Duration::from_secs(5), snapshots.recv())
            .await
            .expect("snapshot should arrive promptly")
            .unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "job-1");

        server.await.unwrap();
        channel.shutdown();
    }

    #[tokio::test]
    async fn send_after_shutdown_reports_channel_closed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Hold the connection open until the client goes away
            while ws.next().await.is_some() {}
        });

        let channel = PushChannel::connect(&format!("ws://{addr}"), None, 8)
            .await
            .unwrap();
        channel.shutdown();

        // The writer task exits on cancellation; give it a beat
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = channel.send(RpcRequest {
            method: Method::Running,
            params: vec![],
            id: "0".to_string(),
        });
        assert!(
            matches!(result, Err(Error::ChannelClosed)),
            "post-shutdown sends must fail deterministically"
        );
    }
}
