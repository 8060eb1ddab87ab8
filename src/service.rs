//! The injectable execution service.
//!
//! One `ExecutionService` per application lifetime, constructed where the
//! application wires its dependencies and passed to whatever needs to run
//! cells. Owning the context handle here (instead of a process-wide global)
//! is what lets tests stand up as many independent contexts as they like.

use tokio::sync::broadcast;

use crate::client::{ExecutionClient, ProgressEvent};
use crate::error::ExecError;
use crate::interpreter::InterpreterFactory;
use crate::spawn::{spawn_context_with_capacity, ContextHandle, DEFAULT_CHANNEL_CAPACITY};

/// Owns one execution context and the client end of its channel.
pub struct ExecutionService {
    client: ExecutionClient,
    handle: ContextHandle,
}

impl ExecutionService {
    /// Spawn a context and wire a client to it.
    ///
    /// The factory runs lazily inside the context on the first `submit`,
    /// not here; a hosting failure (the worker thread cannot be spawned)
    /// surfaces immediately as [`ExecError::ChannelUnavailable`]. Must be
    /// called from within a tokio runtime.
    pub fn start<F: InterpreterFactory>(name: impl Into<String>, factory: F) -> Result<Self, ExecError> {
        Self::start_with_capacity(name, factory, DEFAULT_CHANNEL_CAPACITY)
    }

    /// `start` with an explicit transport channel capacity.
    pub fn start_with_capacity<F: InterpreterFactory>(
        name: impl Into<String>,
        factory: F,
        capacity: usize,
    ) -> Result<Self, ExecError> {
        let (handle, request_tx, response_rx) = spawn_context_with_capacity(name, factory, capacity)?;
        let client = ExecutionClient::new(request_tx, response_rx);
        Ok(Self { client, handle })
    }

    /// Submit code for evaluation. See [`ExecutionClient::submit`].
    pub async fn submit(&self, code: impl Into<String>) -> Result<String, ExecError> {
        self.client.submit(code).await
    }

    /// The client end, for callers that want to hold it directly.
    pub fn client(&self) -> &ExecutionClient {
        &self.client
    }

    /// Subscribe to progress notifications for pending requests.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.client.subscribe_progress()
    }

    /// Whether the context has been told to shut down.
    pub fn is_terminated(&self) -> bool {
        self.handle.is_terminated()
    }

    /// Shut the context down and wait for its thread to finish.
    ///
    /// Blocks until any in-flight evaluation returns; pending calls that
    /// never got a terminal response fail with `ChannelUnavailable`.
    pub fn shutdown(self) {
        let ExecutionService { client, handle } = self;
        drop(client);
        handle.join();
    }
}
