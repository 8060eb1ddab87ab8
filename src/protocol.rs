//! Wire vocabulary shared between the execution client and the execution
//! context.
//!
//! The shapes here are deliberately JSON-friendly: a request is
//! `{id, code}`, a response is `{id, status}` plus a `result` payload for
//! `complete` or an `error` payload for `error`. Correlation ids travel as
//! strings on the wire even though they are counters internally.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token linking a request to its eventual responses.
///
/// Allocated from a per-client monotonic counter, never from a timestamp.
/// Uniqueness among all concurrently pending requests is a hard invariant
/// of the channel, not an assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(pub(crate) u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for CorrelationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for CorrelationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u64>()
            .map(CorrelationId)
            .map_err(serde::de::Error::custom)
    }
}

/// A single code submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id, unique among requests without a terminal response.
    pub id: CorrelationId,
    /// The user-authored code to evaluate.
    pub code: String,
}

/// A response emitted by the execution context, tagged with the status of
/// the request it answers.
///
/// `loading` and `running` are progress notifications; `complete` and
/// `error` are terminal. Per-id ordering is
/// `loading → running → (complete | error)`; nothing is guaranteed across
/// distinct ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    /// One-time interpreter bootstrap is in progress.
    Loading { id: CorrelationId },
    /// The code for this id is being evaluated.
    Running { id: CorrelationId },
    /// Evaluation finished; `result` is the string representation of the
    /// produced value.
    Complete { id: CorrelationId, result: String },
    /// Evaluation (or bootstrap) raised; `error` is the stringified fault.
    Error { id: CorrelationId, error: String },
}

impl Response {
    /// The correlation id this response answers.
    pub fn id(&self) -> CorrelationId {
        match self {
            Response::Loading { id }
            | Response::Running { id }
            | Response::Complete { id, .. }
            | Response::Error { id, .. } => *id,
        }
    }

    /// Whether this response ends the pending call for its id.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Response::Complete { .. } | Response::Error { .. })
    }
}
