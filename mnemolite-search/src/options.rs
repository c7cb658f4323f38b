//! Per-call options for [`crate::service::HybridSearchService::search`].

use mnemolite_embedding::EmbeddingDomain;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub enable_lexical: bool,
    pub enable_vector: bool,
    pub vector_domain: EmbeddingDomain,
    /// Informational only: does not change the fusion algorithm unless an
    /// alternative fusion is selected.
    pub lexical_weight: f32,
    pub vector_weight: f32,
    pub rrf_k: u32,
    /// Strict cutoff applied to vector results only.
    pub distance_threshold: Option<f32>,
    /// If a thresholded vector-only query returns zero results, rerun
    /// without the threshold and annotate the response as degraded.
    pub enable_fallback: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            enable_lexical: true,
            enable_vector: true,
            vector_domain: EmbeddingDomain::Hybrid,
            lexical_weight: 1.0,
            vector_weight: 1.0,
            rrf_k: 60,
            distance_threshold: None,
            enable_fallback: true,
        }
    }
}
