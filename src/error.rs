//! Error types for the execution channel.

/// Errors surfaced to a caller of `submit`.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// No isolated execution context is reachable: the worker thread could
    /// not be spawned, the channel is closed, or the context went away
    /// before a terminal response arrived. The request was not (or will
    /// never be) evaluated.
    #[error("execution channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// The guest code raised during evaluation, or interpreter bootstrap
    /// failed. Both arrive in this one shape; the message is the
    /// stringified fault.
    #[error("execution failed: {0}")]
    Execution(String),
}
