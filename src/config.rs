//! Root configuration: wires the per-crate `from_env()` configs together
//! and adds the facade's own knobs (graph traversal depth, pipeline
//! concurrency).

use mnemolite_common::CoreError;
use mnemolite_embedding::EmbeddingConfig;
use mnemolite_store::StoreConfig;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    /// Upper bound on `traverse`'s `max_depth`, independent of any
    /// per-call override (still clamped to the traversal's own default).
    pub max_traversal_depth: usize,
    /// Bounded worker pool size for per-file pipeline concurrency during
    /// a batch `index` call.
    pub pipeline_concurrency: usize,
}

impl CoreConfig {
    /// Recognized vars beyond the per-crate configs: `CORE_MAX_TRAVERSAL_DEPTH`
    /// (default: 3, matching the Graph Traversal's own default), and
    /// `CORE_PIPELINE_CONCURRENCY` (default: 8).
    pub fn from_env() -> Result<Self, CoreError> {
        use std::env;

        let max_traversal_depth = env::var("CORE_MAX_TRAVERSAL_DEPTH")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(mnemolite_graph::DEFAULT_MAX_DEPTH);

        let pipeline_concurrency = env::var("CORE_PIPELINE_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8);

        let cfg = Self {
            embedding: EmbeddingConfig::from_env()?,
            store: StoreConfig::from_env()?,
            max_traversal_depth,
            pipeline_concurrency,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_traversal_depth == 0 {
            return Err(CoreError::invalid_input("CORE_MAX_TRAVERSAL_DEPTH must be > 0"));
        }
        if self.pipeline_concurrency == 0 {
            return Err(CoreError::invalid_input("CORE_PIPELINE_CONCURRENCY must be > 0"));
        }
        Ok(())
    }

    /// In-memory store, mock embeddings — for tests and local exploration.
    pub fn ephemeral() -> Self {
        Self {
            embedding: EmbeddingConfig::mock(),
            store: StoreConfig::in_memory(),
            max_traversal_depth: mnemolite_graph::DEFAULT_MAX_DEPTH,
            pipeline_concurrency: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_config_is_valid() {
        assert!(CoreConfig::ephemeral().validate().is_ok());
    }

    #[test]
    fn zero_traversal_depth_is_rejected() {
        let mut cfg = CoreConfig::ephemeral();
        cfg.max_traversal_depth = 0;
        assert!(cfg.validate().is_err());
    }
}
