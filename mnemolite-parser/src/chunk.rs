//! The `CodeChunk` schema shared by the Chunker, Metadata Extractor, Symbol
//! Path Builder, Dual Embedding Service, Chunk Store, and Graph Builder.
//!
//! This is intentionally a plain data type with no behavior beyond small
//! constructors — every component that touches a `CodeChunk` owns its own
//! logic for producing or consuming one.

use chrono::{DateTime, Utc};
use mnemolite_common::{LanguageTag, Span};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Function,
    Method,
    Class,
    Module,
}

/// Cyclomatic complexity and size for a chunk. Cyclomatic complexity counts
/// decision points (branches, loops, boolean short-circuits, exception
/// handlers) plus one; the minimum possible value is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complexity {
    pub cyclomatic: u32,
    pub lines_of_code: u32,
}

impl Complexity {
    pub fn new(decision_points: u32, lines_of_code: u32) -> Self {
        Self {
            cyclomatic: decision_points + 1,
            lines_of_code,
        }
    }
}

/// Bounded, partial-tolerant structural metadata. Every field is `Option`
/// or an empty-capable collection: a missing value means *not extractable*,
/// never a fabricated zero or empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub signature: Option<String>,
    pub parameters: Vec<String>,
    pub returns: Option<String>,
    pub decorators: Vec<String>,
    pub docstring: Option<String>,
    pub complexity: Option<Complexity>,
    /// Imports used by this chunk's enclosing file — populated once per
    /// file and copied by reference data into each chunk's metadata, never
    /// recomputed per chunk.
    pub imports: Vec<String>,
    /// Syntactic callee names (last identifier of the call expression), not
    /// resolved symbols. Resolution happens in the Graph Builder.
    pub calls: Vec<String>,
    /// Per-field notes when extraction of a specific field failed; the
    /// rest of the chunk's metadata remains valid.
    pub extraction_errors: Vec<String>,
    /// Set when this chunk came from fixed-size fallback splitting rather
    /// than structural chunking.
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: Uuid,
    pub repository: String,
    pub file_path: String,
    pub span: Span,
    pub kind: ChunkKind,
    pub text: String,
    pub name: String,
    /// Hierarchical qualified name, outermost-to-innermost ancestor first;
    /// assigned by the Symbol Path Builder, empty until then.
    pub name_path: String,
    pub language: LanguageTag,
    pub metadata: ChunkMetadata,
    pub embedding_text: Option<Vec<f32>>,
    pub embedding_code: Option<Vec<f32>>,
    pub commit_hash: Option<String>,
    pub indexed_at: DateTime<Utc>,
}

impl CodeChunk {
    pub fn start_line(&self) -> usize {
        self.span.start_line
    }

    pub fn end_line(&self) -> usize {
        self.span.end_line
    }

    /// Whether this chunk is of a kind the Graph Builder turns into a node
    /// (function, method, or class — constructible callables). Module
    /// chunks (including fixed-size fallback chunks) never become nodes.
    pub fn is_callable_kind(&self) -> bool {
        matches!(self.kind, ChunkKind::Function | ChunkKind::Method | ChunkKind::Class)
    }
}
