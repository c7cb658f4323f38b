//! `HybridSearchService::search`: parallel lexical/vector dispatch, RRF
//! fusion, glob post-filtering, pagination to `k`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use mnemolite_common::CoreError;
use mnemolite_embedding::DualEmbeddingService;
use mnemolite_store::{ChunkRow, ChunkStore, VectorDomain};

use crate::filters::SearchFilters;
use crate::fusion::{RankedSource, rrf_fuse};
use crate::options::SearchOptions;
use crate::response::{SearchHit, SearchResponse};

pub struct HybridSearchService {
    store: Arc<ChunkStore>,
    embeddings: Arc<DualEmbeddingService>,
}

impl HybridSearchService {
    pub fn new(store: Arc<ChunkStore>, embeddings: Arc<DualEmbeddingService>) -> Self {
        Self { store, embeddings }
    }

    pub async fn search(
        &self,
        repository: &str,
        query: &str,
        filters: SearchFilters,
        k: usize,
        options: SearchOptions,
    ) -> Result<SearchResponse, CoreError> {
        let overfetch = (2 * k).max(100);
        let store_filters = filters.to_store_filters();
        let glob = filters.glob_matcher()?;

        let embedding = if options.enable_vector {
            Some(self.embeddings.generate(query, options.vector_domain).await?)
        } else {
            None
        };

        let mut degraded_sources = Vec::new();
        let mut by_id: HashMap<Uuid, ChunkRow> = HashMap::new();
        let mut sources = Vec::new();

        let (lexical_result, text_result, code_result) = tokio::join!(
            self.run_lexical(repository, query, &store_filters, overfetch, options.enable_lexical),
            self.run_vector(repository, &embedding, VectorDomain::Text, &store_filters, overfetch, options.distance_threshold),
            self.run_vector(repository, &embedding, VectorDomain::Code, &store_filters, overfetch, options.distance_threshold),
        );

        if let Some(rows) = lexical_result {
            match rows {
                Ok(hits) => {
                    let ids = hits.iter().map(|h| h.chunk.id).collect();
                    for hit in hits {
                        by_id.insert(hit.chunk.id, hit.chunk);
                    }
                    sources.push(RankedSource { name: "lexical", ranked_ids: ids });
                }
                Err(err) => {
                    warn!(error = %err, "lexical search degraded");
                    degraded_sources.push("lexical");
                }
            }
        }

        let mut vector_empty = true;
        for (label, result) in [("vector_text", text_result), ("vector_code", code_result)] {
            match result {
                None => {}
                Some(Ok(hits)) => {
                    if !hits.is_empty() {
                        vector_empty = false;
                    }
                    let ids = hits.iter().map(|h| h.chunk.id).collect();
                    for hit in hits {
                        by_id.insert(hit.chunk.id, hit.chunk);
                    }
                    sources.push(RankedSource { name: label, ranked_ids: ids });
                }
                Some(Err(err)) => {
                    warn!(error = %err, source = label, "vector search degraded");
                    degraded_sources.push(label);
                }
            }
        }

        let vector_requested = options.enable_vector;
        let mut fallback_triggered = false;
        if !options.enable_lexical
            && vector_requested
            && options.distance_threshold.is_some()
            && vector_empty
            && options.enable_fallback
        {
            fallback_triggered = true;
            sources.clear();
            let (text_retry, code_retry) = tokio::join!(
                self.run_vector(repository, &embedding, VectorDomain::Text, &store_filters, overfetch, None),
                self.run_vector(repository, &embedding, VectorDomain::Code, &store_filters, overfetch, None),
            );
            for (label, result) in [("vector_text", text_retry), ("vector_code", code_retry)] {
                if let Some(Ok(hits)) = result {
                    let ids = hits.iter().map(|h| h.chunk.id).collect();
                    for hit in hits {
                        by_id.insert(hit.chunk.id, hit.chunk);
                    }
                    sources.push(RankedSource { name: label, ranked_ids: ids });
                }
            }
        }

        let fused = rrf_fuse(&sources, options.rrf_k);

        let mut hits = Vec::with_capacity(k);
        for hit in fused {
            let Some(chunk) = by_id.get(&hit.chunk_id) else { continue };
            if let Some(matcher) = &glob {
                if !matcher.is_match(&chunk.file_path) {
                    continue;
                }
            }
            hits.push(SearchHit {
                chunk: chunk.clone(),
                score: hit.score,
                lexical_rank: hit.lexical_rank,
                vector_rank: hit.vector_rank,
            });
            if hits.len() == k {
                break;
            }
        }

        Ok(SearchResponse { hits, degraded_sources, fallback_triggered })
    }

    async fn run_lexical(
        &self,
        repository: &str,
        query: &str,
        filters: &mnemolite_store::ChunkFilters,
        overfetch: usize,
        enabled: bool,
    ) -> Option<Result<Vec<mnemolite_store::LexicalHit>, CoreError>> {
        if !enabled {
            return None;
        }
        let store = self.store.clone();
        let repository = repository.to_string();
        let query = query.to_string();
        let filters = filters.clone();
        Some(
            tokio::task::spawn_blocking(move || store.search_lexical(&repository, &query, &filters, overfetch))
                .await
                .unwrap_or_else(|e| Err(CoreError::InternalInvariantViolated(format!("lexical task panicked: {e}")))),
        )
    }

    async fn run_vector(
        &self,
        repository: &str,
        embedding: &Option<mnemolite_embedding::EmbeddingResult>,
        domain: VectorDomain,
        filters: &mnemolite_store::ChunkFilters,
        overfetch: usize,
        distance_threshold: Option<f32>,
    ) -> Option<Result<Vec<mnemolite_store::VectorHit>, CoreError>> {
        let embedding = embedding.as_ref()?;
        let vector = match domain {
            VectorDomain::Text => embedding.text.as_ref(),
            VectorDomain::Code => embedding.code.as_ref(),
        }?;

        let store = self.store.clone();
        let repository = repository.to_string();
        let vector = vector.clone();
        let filters = filters.clone();
        Some(
            tokio::task::spawn_blocking(move || store.search_vector(&repository, &vector, domain, &filters, overfetch, distance_threshold))
                .await
                .unwrap_or_else(|e| Err(CoreError::InternalInvariantViolated(format!("vector task panicked: {e}")))),
        )
    }
}

// `EmbeddingDomain` is re-exported for callers building `SearchOptions`.
pub use mnemolite_embedding::EmbeddingDomain as VectorSearchDomain;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_common::{LanguageTag, Span};
    use mnemolite_parser::{ChunkKind, ChunkMetadata, CodeChunk};

    fn chunk(name: &str, text: &str) -> CodeChunk {
        CodeChunk {
            id: Uuid::new_v4(),
            repository: "repo-a".to_string(),
            file_path: "src/math.py".to_string(),
            span: Span::new(1, 2, 0, text.len()),
            kind: ChunkKind::Function,
            text: text.to_string(),
            name: name.to_string(),
            name_path: name.to_string(),
            language: LanguageTag::Python,
            metadata: ChunkMetadata::default(),
            embedding_text: Some(vec![0.3; 8]),
            embedding_code: Some(vec![0.4; 8]),
            commit_hash: None,
            indexed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn search_ranks_lexical_and_vector_matches_first() {
        let store = Arc::new(ChunkStore::in_memory().unwrap());
        let embeddings = Arc::new(DualEmbeddingService::mock());

        let a = chunk("add", "def add(a, b): \"Adds two numbers.\" return a + b");
        let b = chunk("unrelated", "def unrelated(): pass");
        store.upsert_batch("repo-a", &[a.clone(), b]).unwrap();

        let service = HybridSearchService::new(store, embeddings);
        let response = service
            .search("repo-a", "numbers", SearchFilters::default(), 5, SearchOptions::default())
            .await
            .unwrap();

        assert!(!response.hits.is_empty());
        assert_eq!(response.hits[0].chunk.id, a.id);
    }

    #[tokio::test]
    async fn glob_filter_excludes_non_matching_paths() {
        let store = Arc::new(ChunkStore::in_memory().unwrap());
        let embeddings = Arc::new(DualEmbeddingService::mock());
        let a = chunk("add", "def add(a, b): return a + b");
        store.upsert_batch("repo-a", std::slice::from_ref(&a)).unwrap();

        let service = HybridSearchService::new(store, embeddings);
        let filters = SearchFilters { file_path_glob: Some("*.rs".to_string()), ..Default::default() };
        let response = service.search("repo-a", "add", filters, 5, SearchOptions::default()).await.unwrap();

        assert!(response.hits.is_empty());
    }
}
