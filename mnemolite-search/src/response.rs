//! The response shape returned by `HybridSearchService::search`.

use mnemolite_store::ChunkRow;

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: ChunkRow,
    pub score: f64,
    pub lexical_rank: Option<u32>,
    pub vector_rank: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    /// Sources (`"lexical"`, `"vector_text"`, `"vector_code"`) that failed
    /// and were excluded from fusion rather than failing the whole query.
    pub degraded_sources: Vec<&'static str>,
    /// Set when a thresholded vector-only query returned zero results and
    /// was rerun without the threshold.
    pub fallback_triggered: bool,
}
