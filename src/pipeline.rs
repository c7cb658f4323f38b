//! Indexing Pipeline: detect → parse → chunk → extract metadata → build
//! symbol paths → embed (dual, HYBRID domain) → persist, plus a
//! per-repository graph build at the end of a batch.
//!
//! Per-file steps abort on an unrecoverable error (the file is recorded
//! under `per_file_errors` and skipped); `ParseFailed` falls back to
//! fixed-size splitting rather than aborting the file.

use mnemolite_common::CoreError;
use mnemolite_embedding::EmbeddingDomain;
use mnemolite_graph::{ChunkerConfig, assign_name_paths, chunk_tree};
use mnemolite_parser::{CodeChunk, ParseOutcome, ParserRegistry, fallback::split_fixed_size};
use serde::Serialize;
use tracing::{info, warn};

use crate::MnemoLiteCore;

/// One file submitted to `index`/`reindex_file`: its repository-relative
/// path, raw bytes, and an optional VCS commit hash stamped onto every
/// chunk produced from it.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub path: String,
    pub content: Vec<u8>,
    pub commit_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub indexed_files: usize,
    pub indexed_chunks: usize,
    pub indexed_nodes: usize,
    pub indexed_edges: usize,
    pub processing_time_ms: u64,
    pub per_file_errors: Vec<FileError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub indexed_chunks: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionReport {
    pub deleted_chunks: usize,
}

impl MnemoLiteCore {
    /// Indexes a batch of files into `repository`, then builds that
    /// repository's graph once from every chunk now on record for it.
    /// Order across files is unspecified; a file's own pipeline steps run
    /// strictly in order.
    pub async fn index(&self, repository: &str, files: Vec<FileInput>) -> Result<BatchSummary, CoreError> {
        let started = std::time::Instant::now();
        let mut summary = BatchSummary::default();

        for file in files {
            let path = file.path.clone();
            match self.index_one_file(repository, &file).await {
                Ok(chunks) => {
                    summary.indexed_files += 1;
                    summary.indexed_chunks += chunks.len();
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "file indexing failed");
                    summary.per_file_errors.push(FileError { path, reason: err.to_string() });
                }
            }
        }

        if summary.indexed_files > 0 {
            let report = self.rebuild_graph(repository)?;
            summary.indexed_nodes = report.nodes_created;
            summary.indexed_edges = report.edges_created;
        }

        summary.processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            repository,
            files = summary.indexed_files,
            chunks = summary.indexed_chunks,
            errors = summary.per_file_errors.len(),
            "batch indexing complete"
        );
        Ok(summary)
    }

    /// Deletes `path`'s previous chunks, re-runs the pipeline for the new
    /// content, then rebuilds `repository`'s graph from its full current
    /// chunk set.
    pub async fn reindex_file(&self, repository: &str, file: FileInput) -> Result<FileSummary, CoreError> {
        let started = std::time::Instant::now();
        self.store.delete_by_file(repository, &file.path)?;

        let chunks = self.index_one_file(repository, &file).await?;
        let indexed_chunks = chunks.len();
        self.rebuild_graph(repository)?;

        Ok(FileSummary {
            indexed_chunks,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Deletes every chunk, node, and edge scoped to `repository`, and
    /// invalidates its cache entries.
    pub fn delete_repository(&self, repository: &str) -> Result<DeletionReport, CoreError> {
        let existing = self.store.list(repository, &Default::default(), i64::MAX as usize, 0)?;
        let deleted_chunks = existing.len();
        self.store.bulk_delete(repository)?;
        self.graph.drop_repository(repository);
        Ok(DeletionReport { deleted_chunks })
    }

    fn rebuild_graph(&self, repository: &str) -> Result<mnemolite_graph::GraphBuildReport, CoreError> {
        let chunks: Vec<CodeChunk> = self
            .store
            .list(repository, &Default::default(), i64::MAX as usize, 0)?
            .into_iter()
            .map(CodeChunk::from)
            .collect();
        Ok(self.graph.build(repository, &chunks))
    }

    /// Runs the seven per-file pipeline steps, returning the chunks
    /// produced (already persisted). `ParseFailed` degrades to fixed-size
    /// splitting rather than aborting; any other error aborts the file.
    async fn index_one_file(&self, repository: &str, file: &FileInput) -> Result<Vec<CodeChunk>, CoreError> {
        let path = std::path::Path::new(&file.path);
        let language = ParserRegistry::detect_language(path, &file.content)?;

        let mut chunks = match ParserRegistry::parse(language, &file.content) {
            ParseOutcome::Parsed(parsed) => {
                let tree = parsed.tree;
                let config = ChunkerConfig::default();
                chunk_tree(repository, &file.path, language, &parsed.source, tree.root_node(), &config)
            }
            ParseOutcome::Failed { reason, .. } => {
                warn!(path = %file.path, %reason, "parse failed, falling back to fixed-size splitting");
                let source = String::from_utf8_lossy(&file.content).into_owned();
                split_fixed_size(repository, &file.path, language, &source, 50)
            }
        };

        assign_name_paths(&mut chunks);

        for chunk in &mut chunks {
            chunk.commit_hash = file.commit_hash.clone();
            if chunk.text.is_empty() {
                continue;
            }
            match self.embeddings.generate(&chunk.text, EmbeddingDomain::Hybrid).await {
                Ok(result) => {
                    chunk.embedding_text = result.text;
                    chunk.embedding_code = result.code;
                }
                Err(err) => {
                    warn!(path = %file.path, chunk = %chunk.id, error = %err, "embedding generation failed, persisting without vectors");
                }
            }
        }

        self.store.upsert_batch(repository, &chunks)?;
        Ok(chunks)
    }
}
