//! Graph node/edge schema produced by the Graph Builder and consumed by
//! Graph Traversal.
//!
//! Node/edge payloads are kept deliberately thin — `properties` carries the
//! display and diagnostic fields rather than growing the struct itself,
//! mirroring how the chunk graph's own payload type stays a flat bag of
//! scalars.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Function,
    Method,
    Class,
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Calls,
    Imports,
}

/// A graph node representing a callable/importable chunk, or a file's
/// module node (created to anchor `imports` edges even when the file itself
/// produced no callable chunk).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: Uuid,
    pub repository: String,
    pub node_type: NodeType,
    pub label: String,
    /// `chunk_id`, `file_path`, and any other display/summary fields.
    pub properties: HashMap<String, String>,
}

impl Node {
    pub fn chunk_id(&self) -> Option<&str> {
        self.properties.get("chunk_id").map(String::as_str)
    }

    pub fn file_path(&self) -> Option<&str> {
        self.properties.get("file_path").map(String::as_str)
    }
}

/// A directed relation between two nodes. No foreign-key enforcement to the
/// chunk store — nodes may be deleted independently of their backing chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_node_id: Uuid,
    pub target_node_id: Uuid,
    pub relation_type: RelationType,
    /// e.g. `{"resolution": "local" | "imported" | "global"}`.
    pub properties: HashMap<String, String>,
}

impl Edge {
    pub fn dedup_key(&self) -> (Uuid, Uuid, RelationType) {
        (self.source_node_id, self.target_node_id, self.relation_type)
    }
}

/// Diagnostic counters from one `build` run. Resolution failures are not
/// errors — they are silently-discarded edges, counted here so operators
/// can see the resolver's coverage without the build itself failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphBuildReport {
    pub nodes_created: usize,
    pub edges_created: usize,
    pub calls_resolved_local: usize,
    pub calls_resolved_imported: usize,
    pub calls_resolved_global: usize,
    pub calls_ambiguous: usize,
    pub calls_unresolved: usize,
    pub calls_filtered_builtin: usize,
}

/// Totals and per-relation-type breakdowns for a repository's persisted
/// graph, as returned by `stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub edges_by_relation: HashMap<String, usize>,
    pub nodes_by_type: HashMap<String, usize>,
}
