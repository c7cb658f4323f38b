//! In-memory per-repository graph storage.
//!
//! Nodes and edges have no independent persistence layer of their own —
//! the Chunk Store owns chunk persistence, and the graph is cheap enough to
//! rebuild from chunks that it lives in memory, one `(Vec<Node>, Vec<Edge>)`
//! per repository, single-writer per repository per the concurrency model.

use std::collections::HashMap;
use std::sync::RwLock;

use mnemolite_common::CoreError;
use mnemolite_graph::{BuildOutput, Direction, Edge, GraphStats, GraphView, Node, Reached, RelationType, build_graph};
use mnemolite_parser::CodeChunk;
use uuid::Uuid;

struct RepositoryGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

#[derive(Default)]
pub struct GraphStore {
    repositories: RwLock<HashMap<String, RepositoryGraph>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds (or rebuilds) `repository`'s graph from its current chunk
    /// set. Failure in this repository never touches any other
    /// repository's graph.
    pub fn build(&self, repository: &str, chunks: &[CodeChunk]) -> mnemolite_graph::GraphBuildReport {
        let BuildOutput { nodes, edges, report } = build_graph(repository, chunks);
        let mut repositories = self.repositories.write().unwrap();
        repositories.insert(repository.to_string(), RepositoryGraph { nodes, edges });
        report
    }

    pub fn drop_repository(&self, repository: &str) {
        self.repositories.write().unwrap().remove(repository);
    }

    pub fn traverse(
        &self,
        repository: &str,
        start: Uuid,
        direction: Direction,
        relation_type: Option<RelationType>,
        max_depth: usize,
    ) -> Result<Vec<Reached>, CoreError> {
        let repositories = self.repositories.read().unwrap();
        let graph = repositories
            .get(repository)
            .ok_or_else(|| CoreError::not_found("repository graph", repository))?;
        let view = GraphView::new(&graph.nodes, &graph.edges);
        Ok(view.traverse(start, direction, relation_type, max_depth))
    }

    pub fn shortest_path(
        &self,
        repository: &str,
        from: Uuid,
        to: Uuid,
        relation_type: Option<RelationType>,
    ) -> Result<Option<Vec<Uuid>>, CoreError> {
        let repositories = self.repositories.read().unwrap();
        let graph = repositories
            .get(repository)
            .ok_or_else(|| CoreError::not_found("repository graph", repository))?;
        let view = GraphView::new(&graph.nodes, &graph.edges);
        Ok(view.shortest_path(from, to, relation_type))
    }

    pub fn stats(&self, repository: &str) -> Result<GraphStats, CoreError> {
        let repositories = self.repositories.read().unwrap();
        let graph = repositories
            .get(repository)
            .ok_or_else(|| CoreError::not_found("repository graph", repository))?;
        let view = GraphView::new(&graph.nodes, &graph.edges);
        Ok(view.stats(repository))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_common::{LanguageTag, Span};
    use mnemolite_parser::{ChunkKind, ChunkMetadata};

    fn chunk(name: &str, calls: Vec<&str>) -> CodeChunk {
        CodeChunk {
            id: Uuid::new_v4(),
            repository: "repo".to_string(),
            file_path: "a.py".to_string(),
            span: Span::new(1, 2, 0, 10),
            kind: ChunkKind::Function,
            text: String::new(),
            name: name.to_string(),
            name_path: name.to_string(),
            language: LanguageTag::Python,
            metadata: ChunkMetadata {
                calls: calls.into_iter().map(str::to_string).collect(),
                ..Default::default()
            },
            embedding_text: None,
            embedding_code: None,
            commit_hash: None,
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn missing_repository_is_not_found() {
        let store = GraphStore::new();
        let result = store.stats("missing");
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn builds_and_traverses_a_call_edge() {
        let a = chunk("caller", vec!["callee"]);
        let b = chunk("callee", vec![]);
        let a_id = a.id;
        let store = GraphStore::new();
        store.build("repo", &[a, b]);

        let a_node = mnemolite_common::ids::node_id(a_id);
        let reached = store.traverse("repo", a_node, Direction::Outbound, None, 3).unwrap();
        assert_eq!(reached.len(), 1);

        // One node per callable chunk (caller, callee) plus one module
        // node anchoring the file, even though this file has no imports.
        let stats = store.stats("repo").unwrap();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 1);
    }
}
