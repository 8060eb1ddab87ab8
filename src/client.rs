//! Requester-facing side of the execution channel.
//!
//! The client allocates correlation ids, keeps the pending-request table,
//! and runs a background listener that routes each response to the matching
//! pending call. Terminal responses resolve or reject exactly one pending
//! entry; progress responses are re-broadcast to observers and never
//! resolve anything.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::ExecError;
use crate::protocol::{CorrelationId, Request, Response};

/// A non-terminal status observed for a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// One-time interpreter bootstrap is in progress.
    Loading,
    /// Evaluation has started.
    Running,
}

/// Progress notification for a pending request, as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub id: CorrelationId,
    pub stage: ProgressStage,
}

/// Completion handles for one pending request. The sender resolves the
/// caller's future with either the result or the stringified fault.
type PendingEntry = oneshot::Sender<Result<String, String>>;

type PendingTable = Arc<Mutex<HashMap<CorrelationId, PendingEntry>>>;

/// Client end of the execution channel.
///
/// `submit` never blocks the calling task beyond the await point of the
/// returned future. No timeout is applied: if the context never emits a
/// terminal response for an id, the call stays pending until the context
/// goes away — callers needing bounded latency wrap `submit` in
/// `tokio::time::timeout`.
pub struct ExecutionClient {
    request_tx: mpsc::Sender<Request>,
    pending: PendingTable,
    next_id: AtomicU64,
    progress_tx: broadcast::Sender<ProgressEvent>,
    listener: tokio::task::JoinHandle<()>,
}

impl ExecutionClient {
    /// Build a client over the transport endpoints of a spawned context.
    ///
    /// Must be called from within a tokio runtime: the response listener is
    /// spawned immediately so that responses arriving before the first
    /// `submit` await are not lost.
    pub fn new(request_tx: mpsc::Sender<Request>, response_rx: mpsc::Receiver<Response>) -> Self {
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let (progress_tx, _) = broadcast::channel(64);

        let listener = tokio::spawn(route_responses(
            response_rx,
            pending.clone(),
            progress_tx.clone(),
        ));

        Self {
            request_tx,
            pending,
            next_id: AtomicU64::new(1),
            progress_tx,
            listener,
        }
    }

    /// Submit code for evaluation and await its terminal response.
    ///
    /// Resolves with the string representation of the evaluated result, or
    /// fails with [`ExecError::Execution`] when the guest code raises (or
    /// bootstrap fails) and [`ExecError::ChannelUnavailable`] when no
    /// context is reachable.
    pub async fn submit(&self, code: impl Into<String>) -> Result<String, ExecError> {
        if self.request_tx.is_closed() {
            return Err(ExecError::ChannelUnavailable(
                "execution context is gone".to_string(),
            ));
        }

        let id = CorrelationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply_tx, reply_rx) = oneshot::channel();

        // Register before sending so a fast response cannot slip past.
        self.pending.lock().unwrap().insert(id, reply_tx);

        let request = Request {
            id,
            code: code.into(),
        };
        if self.request_tx.send(request).await.is_err() {
            self.pending.lock().unwrap().remove(&id);
            return Err(ExecError::ChannelUnavailable(
                "request channel closed".to_string(),
            ));
        }

        match reply_rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(fault)) => Err(ExecError::Execution(fault)),
            Err(_) => Err(ExecError::ChannelUnavailable(
                "context dropped before a terminal response".to_string(),
            )),
        }
    }

    /// Subscribe to progress notifications for all pending requests.
    ///
    /// Events are best-effort: a lagging subscriber misses events rather
    /// than slowing the channel down.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress_tx.subscribe()
    }

    /// Number of requests currently awaiting a terminal response.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

impl Drop for ExecutionClient {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Listener loop: routes every response to the pending entry matching its
/// id. Runs until the context drops its response sender.
async fn route_responses(
    mut response_rx: mpsc::Receiver<Response>,
    pending: PendingTable,
    progress_tx: broadcast::Sender<ProgressEvent>,
) {
    while let Some(response) = response_rx.recv().await {
        match response {
            Response::Loading { id } => {
                let _ = progress_tx.send(ProgressEvent {
                    id,
                    stage: ProgressStage::Loading,
                });
            }
            Response::Running { id } => {
                let _ = progress_tx.send(ProgressEvent {
                    id,
                    stage: ProgressStage::Running,
                });
            }
            Response::Complete { id, result } => deliver(&pending, id, Ok(result)),
            Response::Error { id, error } => deliver(&pending, id, Err(error)),
        }
    }

    tracing::debug!("[client] Response channel closed");
    // Dropping the senders fails the remaining pending calls with
    // ChannelUnavailable rather than leaving them hung.
    pending.lock().unwrap().clear();
}

/// Resolve or reject the pending entry for `id`, exactly once.
///
/// Removal from the table is the idempotency guard: a duplicate terminal
/// response, or one for an id never registered here, finds no entry and is
/// discarded.
fn deliver(pending: &PendingTable, id: CorrelationId, outcome: Result<String, String>) {
    let entry = pending.lock().unwrap().remove(&id);
    match entry {
        // The caller may have stopped awaiting; that is not an error.
        Some(reply_tx) => {
            let _ = reply_tx.send(outcome);
        }
        None => {
            tracing::debug!("[client] No pending entry for id {}, discarding", id);
        }
    }
}
