//! Aggregate health snapshot: the embedding service's own health check plus
//! every named circuit breaker's state. Overall health is degraded if any
//! breaker is `Open`.

use mnemolite_common::CircuitSnapshot;
use mnemolite_embedding::EmbeddingHealth;
use serde::Serialize;

use crate::MnemoLiteCore;

#[derive(Debug, Clone, Serialize)]
pub struct CoreHealth {
    pub embedding: EmbeddingHealth,
    pub shared_cache_circuit: CircuitSnapshot,
    pub degraded: bool,
}

impl MnemoLiteCore {
    pub async fn health(&self) -> CoreHealth {
        let embedding = self.embeddings.health().await;
        let shared_cache_circuit = self.store.cache().breaker().snapshot();
        let degraded = !embedding.text_domain_ok
            || !embedding.code_domain_ok
            || matches!(shared_cache_circuit.state, mnemolite_common::CircuitState::Open);
        CoreHealth { embedding, shared_cache_circuit, degraded }
    }
}
