//! Fixed-size fallback splitting.
//!
//! Used by the Chunker whenever structural chunking is unavailable: parse
//! failure, or a candidate node that remains oversize with no further
//! structure to recurse into. Fallback chunks are always `ChunkKind::Module`
//! with `metadata.truncated = true`, never `Function` — per the Chunker's
//! rule that truncation never pretends to be a semantic unit.

use chrono::Utc;
use mnemolite_common::{LanguageTag, Span};
use uuid::Uuid;

use crate::chunk::{ChunkKind, ChunkMetadata, CodeChunk};

/// Splits `source` into line-bounded windows of at most `max_lines` lines
/// each (no overlap — fallback chunks are meant to be read once per line,
/// not re-embedded with redundant context). Returns an empty vector for
/// empty input, per the "parse failure on a 0-byte file yields zero chunks"
/// boundary rule.
pub fn split_fixed_size(
    repository: &str,
    file_path: &str,
    language: LanguageTag,
    source: &str,
    max_lines: usize,
) -> Vec<CodeChunk> {
    if source.is_empty() {
        return Vec::new();
    }

    let max_lines = max_lines.max(1);
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut out = Vec::with_capacity(lines.len() / max_lines + 1);

    let mut start_line_idx = 0usize;
    let mut byte_cursor = 0usize;

    while start_line_idx < lines.len() {
        let end_line_idx = (start_line_idx + max_lines).min(lines.len());
        let part: String = lines[start_line_idx..end_line_idx].iter().copied().collect();
        let start_byte = byte_cursor;
        let end_byte = start_byte + part.len();

        let span = Span::new(start_line_idx + 1, end_line_idx, start_byte, end_byte);
        let name = format!("{file_path}:{}-{}", span.start_line, span.end_line);
        let id = mnemolite_common::ids::chunk_id(repository, file_path, start_byte, end_byte, &name);

        out.push(CodeChunk {
            id,
            repository: repository.to_string(),
            file_path: file_path.to_string(),
            span,
            kind: ChunkKind::Module,
            text: part,
            name: name.clone(),
            name_path: name,
            language,
            metadata: ChunkMetadata {
                truncated: true,
                ..Default::default()
            },
            embedding_text: None,
            embedding_code: None,
            commit_hash: None,
            indexed_at: Utc::now(),
        });

        byte_cursor = end_byte;
        start_line_idx = end_line_idx;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_no_chunks() {
        let chunks = split_fixed_size("repo", "a.py", LanguageTag::Python, "", 50);
        assert!(chunks.is_empty());
    }

    #[test]
    fn splits_into_bounded_windows() {
        let source: String = (0..120).map(|i| format!("line {i}\n")).collect();
        let chunks = split_fixed_size("repo", "a.py", LanguageTag::Python, &source, 50);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.metadata.truncated));
        assert!(chunks.iter().all(|c| c.kind == ChunkKind::Module));
    }

    #[test]
    fn windows_cover_file_without_gaps() {
        let source: String = (0..10).map(|i| format!("line {i}\n")).collect();
        let chunks = split_fixed_size("repo", "a.py", LanguageTag::Python, &source, 4);
        let mut expected_start = 0usize;
        for c in &chunks {
            assert_eq!(c.span.start_byte, expected_start);
            expected_start = c.span.end_byte;
        }
        assert_eq!(expected_start, source.len());
    }
}
