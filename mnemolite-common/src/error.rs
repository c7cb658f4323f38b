//! The error taxonomy shared by every component of the code intelligence
//! core. Variants are kinds, not incidental wrappers — each one has a
//! specific propagation policy documented on the variant itself.

use thiserror::Error;

/// Unified error type returned by all public crate APIs.
///
/// Propagation policy: `ParseFailed` and `ResolutionAmbiguous` are recovered
/// locally by callers (the Chunker and Graph Builder respectively) and
/// aggregated into batch summaries rather than surfaced directly.
/// `Timeout`, `CircuitOpen`, `Conflict`, and `NotFound` are surfaced to the
/// caller with enough context to decide whether to retry. `Unavailable`
/// marks a transient failure in an external dependency (a refused resource
/// budget, a transport error, a bad response) that a caller may retry or a
/// circuit breaker may count against its failure threshold.
/// `InternalInvariantViolated` is never recovered — it indicates detected
/// corruption and is always a bug.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("parse failed for {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("ambiguous resolution for callee `{callee}` in {file}")]
    ResolutionAmbiguous { callee: String, file: String },

    #[error("operation `{operation}` timed out after {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("circuit `{circuit}` is open; expected recovery in {recovery_in_ms}ms")]
    CircuitOpen {
        circuit: String,
        recovery_in_ms: u64,
    },

    #[error("conflicting write to repository `{repository}`")]
    Conflict { repository: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("{resource} unavailable: {reason}")]
    Unavailable { resource: String, reason: String },

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolated(String),
}

impl CoreError {
    /// Whether the pipeline may recover locally from this error and continue
    /// processing the remainder of a batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::ParseFailed { .. } | CoreError::ResolutionAmbiguous { .. } | CoreError::Unavailable { .. }
        )
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn unavailable(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Unavailable {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
