//! Named, configurable timeouts for every potentially long-running
//! operation in the core.
//!
//! Each call site wraps its future with [`with_timeout`] and a fixed
//! [`Operation`] tag so the resulting [`CoreError::Timeout`] always carries
//! the operation name, matching the "timeouts preserve context" rule.

use std::time::Duration;

use tracing::warn;

use crate::error::CoreError;

/// Named operations that carry their own default timeout. Defaults mirror
/// the suggested table: parse 5s (fallback), embedding 10s, batch embedding
/// 30s, graph construction 10s, graph traversal 5s, per-file end-to-end 60s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Parse,
    Embedding,
    BatchEmbedding,
    GraphConstruction,
    GraphTraversal,
    FileEndToEnd,
    Search,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Parse => "parse",
            Operation::Embedding => "embedding",
            Operation::BatchEmbedding => "batch_embedding",
            Operation::GraphConstruction => "graph_construction",
            Operation::GraphTraversal => "graph_traversal",
            Operation::FileEndToEnd => "file_end_to_end",
            Operation::Search => "search",
        }
    }

    pub fn default_timeout(self) -> Duration {
        match self {
            Operation::Parse => Duration::from_secs(5),
            Operation::Embedding => Duration::from_secs(10),
            Operation::BatchEmbedding => Duration::from_secs(30),
            Operation::GraphConstruction => Duration::from_secs(10),
            Operation::GraphTraversal => Duration::from_secs(5),
            Operation::FileEndToEnd => Duration::from_secs(60),
            Operation::Search => Duration::from_secs(5),
        }
    }
}

/// Runs `fut` under `operation`'s default timeout (or `override_duration` if
/// given), converting an elapsed deadline into `CoreError::Timeout`.
///
/// The overhead added here is a single `tokio::time::timeout` wrapper — no
/// extra allocation or polling beyond what tokio's timer wheel already does.
pub async fn with_timeout<F, T>(
    operation: Operation,
    override_duration: Option<Duration>,
    fut: F,
) -> Result<T, CoreError>
where
    F: std::future::Future<Output = T>,
{
    let duration = override_duration.unwrap_or_else(|| operation.default_timeout());
    match tokio::time::timeout(duration, fut).await {
        Ok(value) => Ok(value),
        Err(_) => {
            warn!(
                operation = operation.name(),
                timeout_ms = duration.as_millis() as u64,
                "operation timed out"
            );
            Err(CoreError::Timeout {
                operation: operation.name().to_string(),
                elapsed_ms: duration.as_millis() as u64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn completes_under_deadline() {
        let result = with_timeout(Operation::Parse, Some(StdDuration::from_millis(50)), async {
            42
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn times_out_past_deadline() {
        let result = with_timeout(Operation::Parse, Some(StdDuration::from_millis(5)), async {
            tokio::time::sleep(StdDuration::from_millis(50)).await;
            42
        })
        .await;
        assert!(matches!(result, Err(CoreError::Timeout { .. })));
    }
}
