//! Spawning the execution context.
//!
//! Each context runs in a dedicated OS thread with its own current-thread
//! tokio runtime, so a long-running evaluation blocks only that thread.
//! The caller gets back a [`ContextHandle`] for lifecycle control plus the
//! two transport endpoints the client consumes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tokio::sync::{mpsc, watch};

use crate::context::{run_context, ContextWorker};
use crate::error::ExecError;
use crate::interpreter::InterpreterFactory;
use crate::protocol::{Request, Response};

/// Default capacity of the request and response channels. The bounded
/// request channel is also the FIFO queue that orders overlapping
/// submissions.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Handle to a spawned execution context.
///
/// Terminating signals the worker to stop between requests; an evaluation
/// already in flight cannot be interrupted and runs to completion on its
/// thread. `join` is therefore explicit rather than part of `Drop`: guest
/// code that never returns would otherwise hang the dropping thread.
pub struct ContextHandle {
    shutdown_tx: watch::Sender<bool>,
    terminated: Arc<AtomicBool>,
    thread_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ContextHandle {
    /// Signal the context to shut down.
    pub fn terminate(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return; // Already terminated
        }
        let _ = self.shutdown_tx.send(true);
    }

    /// Whether the context has been told to shut down.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Terminate and wait for the context thread to finish.
    ///
    /// Blocks until any in-flight evaluation returns.
    pub fn join(self) {
        self.terminate();
        if let Some(handle) = self.thread_handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Spawn an execution context with the default channel capacity.
pub fn spawn_context<F: InterpreterFactory>(
    name: impl Into<String>,
    factory: F,
) -> Result<(ContextHandle, mpsc::Sender<Request>, mpsc::Receiver<Response>), ExecError> {
    spawn_context_with_capacity(name, factory, DEFAULT_CHANNEL_CAPACITY)
}

/// Spawn an execution context with an explicit channel capacity.
pub fn spawn_context_with_capacity<F: InterpreterFactory>(
    name: impl Into<String>,
    factory: F,
    capacity: usize,
) -> Result<(ContextHandle, mpsc::Sender<Request>, mpsc::Receiver<Response>), ExecError> {
    let name = name.into();
    tracing::debug!("[spawn_context] Starting {}", name);

    let terminated = Arc::new(AtomicBool::new(false));
    let terminated_clone = terminated.clone();

    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (response_tx, response_rx) = mpsc::channel(capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = ContextWorker::new(name.clone(), Box::new(factory), response_tx);

    let name_clone = name.clone();
    let thread_handle = thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            tracing::debug!("[spawn_context:{}] Thread started", name_clone);

            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::warn!(
                        "[spawn_context:{}] Failed to build runtime: {}",
                        name_clone,
                        e
                    );
                    return;
                }
            };

            rt.block_on(run_context(worker, terminated_clone, request_rx, shutdown_rx));

            tracing::debug!("[spawn_context:{}] Thread exiting", name_clone);
        })
        .map_err(|e| ExecError::ChannelUnavailable(format!("failed to spawn context thread: {}", e)))?;

    let handle = ContextHandle {
        shutdown_tx,
        terminated,
        thread_handle: Mutex::new(Some(thread_handle)),
    };

    Ok((handle, request_tx, response_rx))
}
