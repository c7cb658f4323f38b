//! MnemoLite Code Intelligence Core: a library facade over the Indexing
//! Pipeline, the Chunk Store, Hybrid Search, and the call graph.
//!
//! No wire encoding (HTTP, CLI, gRPC) lives here — `MnemoLiteCore` exposes
//! plain async methods and leaves transport to its caller.

pub mod config;
pub mod graph_store;
pub mod health;
pub mod pipeline;

use std::sync::Arc;

use uuid::Uuid;

pub use config::CoreConfig;
pub use health::CoreHealth;
pub use pipeline::{BatchSummary, DeletionReport, FileError, FileInput, FileSummary};

use mnemolite_common::{CoreError, Operation, with_timeout};
use mnemolite_embedding::DualEmbeddingService;
use mnemolite_graph::{Direction, GraphStats, Reached, RelationType};
use mnemolite_search::{HybridSearchService, SearchFilters, SearchOptions, SearchResponse};
use mnemolite_store::{ChunkFilters, ChunkRow, ChunkStore};

use graph_store::GraphStore;

/// The entry point: one instance per process (or per tenant, if a caller
/// wants repository isolation at a coarser grain than the `repository`
/// argument already gives every method).
pub struct MnemoLiteCore {
    config: CoreConfig,
    store: Arc<ChunkStore>,
    embeddings: Arc<DualEmbeddingService>,
    graph: GraphStore,
    search: HybridSearchService,
}

impl MnemoLiteCore {
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let store = Arc::new(ChunkStore::open(&config.store)?);
        let embeddings = Arc::new(DualEmbeddingService::new(config.embedding.clone()));
        let search = HybridSearchService::new(store.clone(), embeddings.clone());
        Ok(Self {
            config,
            store,
            embeddings,
            graph: GraphStore::new(),
            search,
        })
    }

    /// In-memory store, mock embeddings — for tests and local exploration.
    pub fn ephemeral() -> Result<Self, CoreError> {
        Self::new(CoreConfig::ephemeral())
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Dispatches lexical and vector search in parallel, fuses with
    /// Reciprocal Rank Fusion, and applies glob post-filtering.
    pub async fn search(
        &self,
        repository: &str,
        query: &str,
        filters: SearchFilters,
        k: usize,
        options: SearchOptions,
    ) -> Result<SearchResponse, CoreError> {
        with_timeout(Operation::Search, None, self.search.search(repository, query, filters, k, options)).await?
    }

    /// Exact or substring lookup against a chunk's fully-qualified symbol
    /// path (e.g. `module.Class.method`).
    pub fn find_by_name_path(&self, repository: &str, path: &str, substring: bool) -> Result<Vec<ChunkRow>, CoreError> {
        self.store.find_by_name_path(repository, path, substring)
    }

    /// Lists chunks in `repository` matching `filters`, newest first,
    /// paginated by `limit`/`offset`.
    pub fn list_chunks(&self, repository: &str, filters: &ChunkFilters, limit: usize, offset: usize) -> Result<Vec<ChunkRow>, CoreError> {
        self.store.list(repository, filters, limit, offset)
    }

    /// Walks the call/import graph from `start` up to `max_depth` hops,
    /// clamped to the configured `max_traversal_depth`.
    pub async fn traverse(
        &self,
        repository: &str,
        start: Uuid,
        direction: Direction,
        relation_type: Option<RelationType>,
        max_depth: usize,
    ) -> Result<Vec<Reached>, CoreError> {
        let depth = max_depth.min(self.config.max_traversal_depth);
        let repository = repository.to_string();
        with_timeout(Operation::GraphTraversal, None, async move {
            self.graph.traverse(&repository, start, direction, relation_type, depth)
        })
        .await?
    }

    pub async fn shortest_path(
        &self,
        repository: &str,
        from: Uuid,
        to: Uuid,
        relation_type: Option<RelationType>,
    ) -> Result<Option<Vec<Uuid>>, CoreError> {
        let repository = repository.to_string();
        with_timeout(Operation::GraphTraversal, None, async move { self.graph.shortest_path(&repository, from, to, relation_type) }).await?
    }

    pub fn graph_stats(&self, repository: &str) -> Result<GraphStats, CoreError> {
        self.graph.stats(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ephemeral_core_starts_with_empty_repository_graph() {
        let core = MnemoLiteCore::ephemeral().unwrap();
        let result = core.graph_stats("nowhere");
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn index_then_search_then_traverse_round_trips() {
        let core = MnemoLiteCore::ephemeral().unwrap();
        let file = FileInput {
            path: "pkg/math.py".to_string(),
            content: b"def add(a, b):\n    \"\"\"Adds two numbers.\"\"\"\n    return a + b\n\n\ndef use_add():\n    return add(1, 2)\n".to_vec(),
            commit_hash: Some("abc123".to_string()),
        };
        let summary = core.index("repo", vec![file]).await.unwrap();
        assert_eq!(summary.indexed_files, 1);
        assert!(summary.indexed_chunks >= 2);
        assert!(summary.indexed_nodes >= 2);

        let response = core
            .search("repo", "adds two numbers", SearchFilters::default(), 5, SearchOptions::default())
            .await
            .unwrap();
        assert!(!response.hits.is_empty());

        let stats = core.graph_stats("repo").unwrap();
        assert!(stats.node_count >= 2);
    }
}
