//! Row shapes persisted by the store and returned from queries.
//!
//! `ChunkRow` mirrors `mnemolite_parser::CodeChunk` but with the two
//! embedding vectors excluded from the default row and instead carried as
//! detached vectors only where a caller actually needs them for vector
//! search — avoids pulling two 768-float vectors off disk for every lexical
//! or listing query.

use chrono::{DateTime, Utc};
use mnemolite_common::{LanguageTag, Span};
use mnemolite_parser::{ChunkKind, ChunkMetadata, CodeChunk};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRow {
    pub id: Uuid,
    pub repository: String,
    pub file_path: String,
    pub span: Span,
    pub kind: ChunkKind,
    pub text: String,
    pub name: String,
    pub name_path: String,
    pub language: LanguageTag,
    pub metadata: ChunkMetadata,
    pub commit_hash: Option<String>,
    pub indexed_at: DateTime<Utc>,
}

impl From<&CodeChunk> for ChunkRow {
    fn from(chunk: &CodeChunk) -> Self {
        Self {
            id: chunk.id,
            repository: chunk.repository.clone(),
            file_path: chunk.file_path.clone(),
            span: chunk.span,
            kind: chunk.kind,
            text: chunk.text.clone(),
            name: chunk.name.clone(),
            name_path: chunk.name_path.clone(),
            language: chunk.language,
            metadata: chunk.metadata.clone(),
            commit_hash: chunk.commit_hash.clone(),
            indexed_at: chunk.indexed_at,
        }
    }
}

/// Reconstructs a `CodeChunk` without its embeddings, for callers (the
/// Graph Builder) that only need structural fields.
impl From<ChunkRow> for CodeChunk {
    fn from(row: ChunkRow) -> Self {
        Self {
            id: row.id,
            repository: row.repository,
            file_path: row.file_path,
            span: row.span,
            kind: row.kind,
            text: row.text,
            name: row.name,
            name_path: row.name_path,
            language: row.language,
            metadata: row.metadata,
            embedding_text: None,
            embedding_code: None,
            commit_hash: row.commit_hash,
            indexed_at: row.indexed_at,
        }
    }
}

/// A filter set applied to `list`/`search_lexical`/`search_vector`. Every
/// field is optional; an all-`None` filter matches every chunk in the
/// repository.
#[derive(Debug, Clone, Default)]
pub struct ChunkFilters {
    pub language: Option<LanguageTag>,
    pub kind: Option<ChunkKind>,
    pub file_path_prefix: Option<String>,
}

/// The embedding domain a vector search targets; re-exported here rather
/// than depending on `mnemolite-embedding` to keep the store's dependency
/// graph one-directional (embedding producers feed the store, the store
/// never calls back into embedding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorDomain {
    Text,
    Code,
}

#[derive(Debug, Clone, Serialize)]
pub struct LexicalHit {
    pub chunk: ChunkRow,
    pub rank: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorHit {
    pub chunk: ChunkRow,
    pub distance: f32,
}

/// A partial update to an existing chunk. Every field is optional; an
/// all-`None` patch is rejected by the store rather than silently touching
/// `indexed_at` for a no-op write.
#[derive(Debug, Clone, Default)]
pub struct ChunkPatch {
    pub metadata: Option<ChunkMetadata>,
    pub embedding_text: Option<Vec<f32>>,
    pub embedding_code: Option<Vec<f32>>,
    pub commit_hash: Option<String>,
}

impl ChunkPatch {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_none() && self.embedding_text.is_none() && self.embedding_code.is_none() && self.commit_hash.is_none()
    }
}
