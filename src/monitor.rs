//! Background synchronization: snapshots in, notifications out.
//!
//! [`JobMonitor`] ties the push channel, the [`JobStateStore`], and the
//! [`LifecycleNotifier`] together: one spawned task applies each incoming
//! snapshot to the store and broadcasts the lifecycle transitions it
//! produces. An optional second task re-requests `running()` at a fixed
//! interval, so views relying on periodic refresh and views relying on
//! server-initiated pushes read the same store under the same full-replace
//! contract.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

use crate::notifier::{LifecycleEvent, LifecycleNotifier};
use crate::rpc::RpcClient;
use crate::rpc::push::JobSnapshot;
use crate::store::JobStateStore;

/// Owner of the shared job store and the notification fan-out
pub struct JobMonitor {
    store: Arc<RwLock<JobStateStore>>,
    events: broadcast::Sender<LifecycleEvent>,
    cancel: CancellationToken,
}

impl JobMonitor {
    /// Create a monitor with the given notification buffer size
    pub fn new(notification_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(notification_buffer.max(1));
        Self {
            store: Arc::new(RwLock::new(JobStateStore::new())),
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Shared handle to the job store (read-mostly; only the snapshot task
    /// writes)
    pub fn store(&self) -> Arc<RwLock<JobStateStore>> {
        Arc::clone(&self.store)
    }

    /// Subscribe to lifecycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Subscribe to lifecycle notifications as a stream.
    ///
    /// Convenience wrapper over [`JobMonitor::subscribe`] for callers that
    /// forward notifications into combinators or SSE-style sinks. A lagged
    /// subscriber yields a [`BroadcastStreamRecvError`] item and then
    /// resumes at the newest notification.
    ///
    /// [`BroadcastStreamRecvError`]: tokio_stream::wrappers::errors::BroadcastStreamRecvError
    pub fn event_stream(&self) -> BroadcastStream<LifecycleEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    /// Start consuming a snapshot stream.
    ///
    /// Each snapshot is applied to the store with full-replace semantics,
    /// then observed by the notifier; resulting events go to all
    /// subscribers. A lagged receiver skips to newer snapshots, which under
    /// full-replace semantics loses nothing. The task exits on
    /// [`JobMonitor::shutdown`] or when the stream's sender side closes.
    pub fn start(
        &self,
        mut snapshots: broadcast::Receiver<JobSnapshot>,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut notifier = LifecycleNotifier::new();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Job monitor shutting down");
                        break;
                    }
                    snapshot = snapshots.recv() => {
                        match snapshot {
                            Ok(snapshot) => {
                                let transitions = {
                                    let mut store = store.write().await;
                                    store.apply_snapshot(snapshot);
                                    notifier.observe(&store)
                                };
                                for event in transitions {
                                    // Send fails only with zero subscribers
                                    let _ = events.send(event);
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "Snapshot consumer lagged, skipping to latest");
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                tracing::info!("Snapshot stream closed, job monitor stopping");
                                break;
                            }
                        }
                    }
                }
            }
        })
    }

    /// Start the periodic refresh requester.
    ///
    /// Emits `running()` on the push channel once immediately and then at
    /// every interval tick. A failed emission is logged and skipped: local
    /// state stays untouched and the next tick tries again; the loop itself
    /// is the only retry mechanism.
    pub fn start_requester(
        &self,
        client: Arc<RpcClient>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Snapshot requester shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = client.running() {
                            tracing::warn!(error = %e, "Snapshot request failed");
                        }
                    }
                }
            }
        })
    }

    /// Stop all tasks started from this monitor.
    ///
    /// Deterministic: after the spawned tasks observe the cancellation, no
    /// further snapshots are applied and no further notifications fire.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
