//! Worker loop for the execution context.
//!
//! The context is the isolated unit of control that owns the single
//! interpreter instance. It processes requests strictly sequentially: each
//! request runs to its terminal response before the next is taken from the
//! channel, so the bounded request channel doubles as the FIFO queue that
//! serializes access to the shared namespace.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::interpreter::{Interpreter, InterpreterFactory};
use crate::protocol::{Request, Response};

/// Lifecycle of the execution context.
///
/// `Uninitialized → Initializing → Ready ⇄ Running`, with `Failed` as the
/// terminal state when the one-time bootstrap raises. A failed context is
/// never re-initialized; requests observed in `Failed` are answered with an
/// error naming the original bootstrap fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Uninitialized,
    Initializing,
    Ready,
    Running,
    Failed,
}

pub(crate) struct ContextWorker {
    name: String,
    state: ContextState,
    factory: Box<dyn InterpreterFactory>,
    interpreter: Option<Box<dyn Interpreter>>,
    bootstrap_fault: Option<String>,
    response_tx: mpsc::Sender<Response>,
}

impl ContextWorker {
    pub(crate) fn new(
        name: String,
        factory: Box<dyn InterpreterFactory>,
        response_tx: mpsc::Sender<Response>,
    ) -> Self {
        Self {
            name,
            state: ContextState::Uninitialized,
            factory,
            interpreter: None,
            bootstrap_fault: None,
            response_tx,
        }
    }

    /// Process one request through to its terminal response.
    async fn handle(&mut self, req: Request) {
        let Request { id, code } = req;

        if self.state == ContextState::Uninitialized {
            self.state = ContextState::Initializing;
            tracing::debug!("[context:{}] Initializing interpreter", self.name);
            self.emit(Response::Loading { id }).await;

            match self.factory.create() {
                Ok(interpreter) => {
                    self.interpreter = Some(interpreter);
                    self.state = ContextState::Ready;
                    tracing::debug!("[context:{}] Interpreter ready", self.name);
                }
                Err(fault) => {
                    tracing::warn!(
                        "[context:{}] Interpreter bootstrap failed: {}",
                        self.name,
                        fault
                    );
                    self.emit(Response::Error {
                        id,
                        error: fault.clone(),
                    })
                    .await;
                    self.bootstrap_fault = Some(fault);
                    self.state = ContextState::Failed;
                    return;
                }
            }
        }

        if self.state == ContextState::Failed {
            let fault = self
                .bootstrap_fault
                .as_deref()
                .unwrap_or("interpreter bootstrap failed");
            self.emit(Response::Error {
                id,
                error: format!("interpreter unavailable: {}", fault),
            })
            .await;
            return;
        }

        self.state = ContextState::Running;
        self.emit(Response::Running { id }).await;

        // Sole owner of the interpreter; present whenever state is Running.
        let interpreter = self
            .interpreter
            .as_mut()
            .expect("interpreter present in Running state");

        // Blocks this thread for as long as the guest code runs.
        let response = match interpreter.eval(&code) {
            Ok(result) => Response::Complete { id, result },
            Err(error) => Response::Error { id, error },
        };
        self.emit(response).await;
        self.state = ContextState::Ready;
    }

    async fn emit(&self, response: Response) {
        // The client side may have gone away; nothing to do about it here.
        if self.response_tx.send(response).await.is_err() {
            tracing::debug!("[context:{}] Response channel closed", self.name);
        }
    }
}

/// The main loop that runs inside the spawned context thread.
///
/// Waits for requests or shutdown; each request is handled fully before the
/// next is received, which is what keeps interpreter access single-threaded
/// without a lock.
pub(crate) async fn run_context(
    mut worker: ContextWorker,
    terminated: Arc<AtomicBool>,
    mut request_rx: mpsc::Receiver<Request>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() || terminated.load(Ordering::SeqCst) {
            tracing::debug!("[context:{}] Shutdown signal received", worker.name);
            break;
        }

        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::debug!("[context:{}] Shutdown signal received", worker.name);
                    break;
                }
            }

            req = request_rx.recv() => {
                match req {
                    Some(req) => worker.handle(req).await,
                    None => {
                        tracing::debug!("[context:{}] Request channel closed", worker.name);
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("[context:{}] Worker finished", worker.name);
}
