//! Symbol Path Builder: assigns each chunk its hierarchical `name_path`
//! using strict byte-range containment.
//!
//! For a chunk C, every other chunk in the same file whose span strictly
//! contains C's span is an ancestor. Ancestors are ordered outermost first
//! (module, then class, then method) and their short names concatenated
//! with `/`. Reversing that order silently corrupts every downstream
//! `find_by_name_path` lookup, so ordering has a direct test below rather
//! than relying on the containment test alone.

use mnemolite_common::Span;
use mnemolite_parser::CodeChunk;

/// Whether `outer` strictly contains `inner`: `outer.start_byte <
/// inner.start_byte` and `inner.end_byte < outer.end_byte`. Never `<=`/`>=`
/// — inclusive bounds would nest two siblings whose printed ranges happen
/// to touch at a shared boundary byte (see `touching_siblings_are_not_nested`
/// below).
fn is_strict_ancestor(outer: &Span, inner: &Span) -> bool {
    outer.start_byte < inner.start_byte && inner.end_byte < outer.end_byte
}

/// Assigns `name_path` on every chunk in `chunks`, grouping by `file_path`
/// so that containment is only ever checked within one file.
pub fn assign_name_paths(chunks: &mut [CodeChunk]) {
    let mut by_file: std::collections::HashMap<String, Vec<usize>> = std::collections::HashMap::new();
    for (i, c) in chunks.iter().enumerate() {
        by_file.entry(c.file_path.clone()).or_default().push(i);
    }

    for indices in by_file.into_values() {
        for &i in &indices {
            let span = chunks[i].span;
            let mut ancestors: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&j| j != i && is_strict_ancestor(&chunks[j].span, &span))
                .collect();

            // Outermost first: a wider span starts no later and ends no
            // earlier than anything it strictly contains, so sorting by
            // ascending start then descending end places it first.
            ancestors.sort_by(|&a, &b| {
                chunks[a]
                    .span
                    .start_byte
                    .cmp(&chunks[b].span.start_byte)
                    .then(chunks[b].span.end_byte.cmp(&chunks[a].span.end_byte))
            });

            let mut path: Vec<String> = ancestors.iter().map(|&j| chunks[j].name.clone()).collect();
            path.push(chunks[i].name.clone());
            chunks[i].name_path = path.join("/");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_common::{LanguageTag, Span};
    use mnemolite_parser::{ChunkKind, ChunkMetadata};

    fn chunk(name: &str, start: usize, end: usize) -> CodeChunk {
        CodeChunk {
            id: uuid::Uuid::new_v4(),
            repository: "repo".to_string(),
            file_path: "a.py".to_string(),
            span: Span::new(1, 1, start, end),
            kind: ChunkKind::Method,
            text: String::new(),
            name: name.to_string(),
            name_path: String::new(),
            language: LanguageTag::Python,
            metadata: ChunkMetadata::default(),
            embedding_text: None,
            embedding_code: None,
            commit_hash: None,
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn name_path_is_outermost_first() {
        let mut chunks = vec![
            chunk("mod", 0, 100),
            chunk("Greeter", 10, 90),
            chunk("hello", 20, 40),
        ];
        assign_name_paths(&mut chunks);
        assert_eq!(chunks[2].name_path, "mod/Greeter/hello");
    }

    #[test]
    fn touching_siblings_are_not_nested() {
        let mut chunks = vec![chunk("first", 0, 50), chunk("second", 50, 100)];
        assign_name_paths(&mut chunks);
        assert_eq!(chunks[0].name_path, "first");
        assert_eq!(chunks[1].name_path, "second");
    }

    #[test]
    fn strict_ancestor_check_excludes_touching_and_equal_spans() {
        let a = Span::new(1, 20, 0, 100);
        let b = Span::new(20, 40, 100, 200);
        assert!(!is_strict_ancestor(&a, &b));
        assert!(!is_strict_ancestor(&b, &a));
        assert!(!is_strict_ancestor(&a, &a));

        let outer = Span::new(1, 50, 0, 500);
        let inner = Span::new(10, 20, 50, 200);
        assert!(is_strict_ancestor(&outer, &inner));
        assert!(!is_strict_ancestor(&inner, &outer));
    }

    #[test]
    fn root_level_chunk_has_bare_name() {
        let mut chunks = vec![chunk("top", 0, 10)];
        assign_name_paths(&mut chunks);
        assert_eq!(chunks[0].name_path, "top");
    }
}
