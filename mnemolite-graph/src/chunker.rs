//! Split-then-merge semantic chunking.
//!
//! Walks a Tree-sitter tree, emitting one chunk per structural unit (class,
//! function, method) unless it is oversize, in which case the walk recurses
//! into its members instead of emitting it whole. Adjacent non-structural
//! top-level content (imports, top-level statements) is merged into
//! `Module` chunks. Parse failure is handled upstream by the caller falling
//! back to [`mnemolite_parser::fallback::split_fixed_size`] over the raw
//! bytes — this module only ever sees a tree that parsed cleanly.

use chrono::Utc;
use mnemolite_common::{LanguageTag, Span};
use mnemolite_parser::{ChunkKind, ChunkMetadata, CodeChunk};
use tree_sitter::Node;

use crate::grammar::{LanguageGrammar, grammar_for};
use crate::metadata;

pub struct ChunkerConfig {
    pub max_chunk_size_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size_chars: 2000,
        }
    }
}

struct Ctx<'a> {
    source: &'a str,
    grammar: &'static LanguageGrammar,
    repository: &'a str,
    file_path: &'a str,
    language: LanguageTag,
    max_chars: usize,
    file_imports: Vec<String>,
}

/// Produces the ordered chunk sequence for one successfully parsed file.
/// Metadata is built alongside chunking rather than in a second pass: the
/// Tree-sitter `Node` backing each candidate is only live during this walk.
pub fn chunk_tree(
    repository: &str,
    file_path: &str,
    language: LanguageTag,
    source: &str,
    root: Node,
    config: &ChunkerConfig,
) -> Vec<CodeChunk> {
    let grammar = grammar_for(language);
    let file_imports = metadata::extract_file_imports(grammar, source, root);
    let ctx = Ctx {
        source,
        grammar,
        repository,
        file_path,
        language,
        max_chars: config.max_chunk_size_chars,
        file_imports,
    };

    let mut out = Vec::new();
    let mut cursor = root.walk();
    process_level(&ctx, root.children(&mut cursor).collect::<Vec<_>>(), false, &mut out);
    out
}

/// Processes one structural level (the children of the root, or of a class
/// body): emits a chunk per structural member, and merges everything else
/// into adjacent `Module` chunks. `nested` is true when `children` are a
/// class-like node's body, so a matching rule's `kind_if_nested` applies
/// instead of `kind_if_top_level`.
fn process_level(ctx: &Ctx, children: Vec<Node>, nested: bool, out: &mut Vec<CodeChunk>) {
    let mut loose_start: Option<usize> = None;
    let mut loose_end: usize = 0;

    let flush_loose = |start: Option<usize>, end: usize, out: &mut Vec<CodeChunk>| {
        if let Some(start) = start {
            if end > start {
                emit_module_runs(ctx, start, end, out);
            }
        }
    };

    for child in children {
        if let Some(rule) = ctx
            .grammar
            .chunk_rules
            .iter()
            .find(|r| r.node_kind == child.kind())
        {
            flush_loose(loose_start, loose_end, out);
            loose_start = None;

            let kind = if nested { rule.kind_if_nested } else { rule.kind_if_top_level };
            emit_candidate(ctx, child, kind, out);
        } else if child.is_named() {
            if loose_start.is_none() {
                loose_start = Some(child.start_byte());
            }
            loose_end = child.end_byte();
        }
    }

    flush_loose(loose_start, loose_end, out);
}

fn emit_candidate(
    ctx: &Ctx,
    node: Node,
    kind: ChunkKind,
    out: &mut Vec<CodeChunk>,
) {
    let is_class_like = ctx.grammar.class_like_kinds.contains(&node.kind());
    let body = is_class_like.then(|| node.child_by_field_name("body")).flatten();
    let members: Vec<Node> = body
        .map(|b| {
            let mut c = b.walk();
            b.children(&mut c)
                .filter(|n| ctx.grammar.chunk_rules.iter().any(|r| r.node_kind == n.kind()))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let size = node.end_byte().saturating_sub(node.start_byte());
    let has_members = !members.is_empty();

    if has_members {
        // Tie-break: prefer a class's members as separate chunks over one
        // combined class chunk, regardless of whether the class as a whole
        // would fit under the size budget.
        if let Some(body) = body {
            let mut cursor = body.walk();
            process_level(ctx, body.children(&mut cursor).collect(), true, out);
        }
        return;
    }

    if size <= ctx.max_chars {
        out.push(build_chunk(ctx, node, kind));
        return;
    }

    // Oversize leaf with no further structure: fall back to fixed-size
    // splitting over this node's own byte range.
    let text = &ctx.source[node.start_byte()..node.end_byte()];
    let mut fallback = mnemolite_parser::fallback::split_fixed_size(
        ctx.repository,
        ctx.file_path,
        ctx.language,
        text,
        50,
    );
    rebase_fallback_spans(&mut fallback, node, ctx.source);
    out.extend(fallback);
}

fn build_chunk(ctx: &Ctx, node: Node, kind: ChunkKind) -> CodeChunk {
    let name = extract_name(ctx, node);
    let span = node_span(node);
    let text = ctx.source[node.start_byte()..node.end_byte()].to_string();
    let id = mnemolite_common::ids::chunk_id(
        ctx.repository,
        ctx.file_path,
        span.start_byte,
        span.end_byte,
        &name,
    );
    let metadata = metadata::build_metadata(ctx.grammar, ctx.source, node, &ctx.file_imports);

    CodeChunk {
        id,
        repository: ctx.repository.to_string(),
        file_path: ctx.file_path.to_string(),
        span,
        kind,
        text,
        name: name.clone(),
        name_path: name,
        language: ctx.language,
        metadata,
        embedding_text: None,
        embedding_code: None,
        commit_hash: None,
        indexed_at: Utc::now(),
    }
}

/// Merges a loose byte range (top-level statements not captured by any
/// chunk rule) into one or more `Module` chunks, splitting whenever the
/// accumulated range would exceed the size budget.
fn emit_module_runs(ctx: &Ctx, start: usize, end: usize, out: &mut Vec<CodeChunk>) {
    let mut cursor = start;
    while cursor < end {
        let window_end = (cursor + ctx.max_chars).min(end);
        let text = &ctx.source[cursor..window_end];
        if text.trim().is_empty() {
            cursor = window_end;
            continue;
        }
        let span = byte_range_to_span(ctx.source, cursor, window_end);
        let name = format!("{}:{}-{}", ctx.file_path, span.start_line, span.end_line);
        let id = mnemolite_common::ids::chunk_id(ctx.repository, ctx.file_path, cursor, window_end, &name);
        out.push(CodeChunk {
            id,
            repository: ctx.repository.to_string(),
            file_path: ctx.file_path.to_string(),
            span,
            kind: ChunkKind::Module,
            text: text.to_string(),
            name: name.clone(),
            name_path: name,
            language: ctx.language,
            metadata: ChunkMetadata {
                imports: ctx.file_imports.clone(),
                ..Default::default()
            },
            embedding_text: None,
            embedding_code: None,
            commit_hash: None,
            indexed_at: Utc::now(),
        });
        cursor = window_end;
    }
}

fn extract_name(ctx: &Ctx, node: Node) -> String {
    if let Some(name_node) = node.child_by_field_name(ctx.grammar.name_field) {
        return ctx.source[name_node.start_byte()..name_node.end_byte()].to_string();
    }
    // Go's `type_declaration` nests the named `type_spec`; walk one level.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(name_node) = child.child_by_field_name(ctx.grammar.name_field) {
            return ctx.source[name_node.start_byte()..name_node.end_byte()].to_string();
        }
    }
    format!("<anonymous@{}>", node.start_byte())
}

fn node_span(node: Node) -> Span {
    Span::new(
        node.start_position().row + 1,
        node.end_position().row + 1,
        node.start_byte(),
        node.end_byte(),
    )
}

fn byte_range_to_span(source: &str, start: usize, end: usize) -> Span {
    let start_line = source[..start].matches('\n').count() + 1;
    let end_line = source[..end].matches('\n').count() + 1;
    Span::new(start_line, end_line, start, end)
}

fn rebase_fallback_spans(chunks: &mut [CodeChunk], node: Node, source: &str) {
    let base_byte = node.start_byte();
    let base_line = node.start_position().row;
    for c in chunks.iter_mut() {
        let new_start_byte = base_byte + c.span.start_byte;
        let new_end_byte = base_byte + c.span.end_byte;
        c.span = Span::new(
            base_line + c.span.start_line,
            base_line + c.span.end_line,
            new_start_byte,
            new_end_byte,
        );
        let name = format!("{}:{}-{}", c.file_path, c.span.start_line, c.span.end_line);
        c.id = mnemolite_common::ids::chunk_id(&c.repository, &c.file_path, new_start_byte, new_end_byte, &name);
        c.name = name.clone();
        c.name_path = name;
        let _ = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemolite_parser::ParserRegistry;

    fn parse(source: &str) -> tree_sitter::Tree {
        match ParserRegistry::parse(LanguageTag::Python, source.as_bytes()) {
            mnemolite_parser::registry::ParseOutcome::Parsed(p) => p.tree,
            _ => panic!("expected successful parse"),
        }
    }

    #[test]
    fn emits_one_chunk_per_function() {
        let source = "def add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b\n";
        let tree = parse(source);
        let chunks = chunk_tree("repo", "a.py", LanguageTag::Python, source, tree.root_node(), &ChunkerConfig::default());
        let names: Vec<_> = chunks.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"add"));
        assert!(names.contains(&"sub"));
    }

    #[test]
    fn class_methods_become_separate_chunks() {
        let source = "class Greeter:\n    def hello(self):\n        return 'hi'\n\n    def bye(self):\n        return 'bye'\n";
        let tree = parse(source);
        let chunks = chunk_tree("repo", "a.py", LanguageTag::Python, source, tree.root_node(), &ChunkerConfig::default());
        assert_eq!(chunks.iter().filter(|c| c.kind == ChunkKind::Method).count(), 2);
        assert!(chunks.iter().all(|c| c.kind != ChunkKind::Class));
    }

    /// Two top-level classes with no shared byte range must come out as
    /// siblings, never nested into one another, regardless of how close
    /// their printed line numbers sit.
    #[test]
    fn adjacent_sibling_classes_are_never_nested() {
        let source = "class A:\n    def m(self):\n        pass\nclass B:\n    def n(self):\n        pass\n";
        let tree = parse(source);
        let mut chunks = chunk_tree("repo", "a.py", LanguageTag::Python, source, tree.root_node(), &ChunkerConfig::default());
        let a_end = chunks.iter().find(|c| c.name == "m").unwrap().span.end_byte;
        let b_start = chunks.iter().find(|c| c.name == "n").unwrap().span.start_byte;
        assert!(a_end <= b_start, "class A's method must end at or before class B's method starts");

        crate::symbols::assign_name_paths(&mut chunks);
        assert_eq!(chunks.iter().find(|c| c.name == "m").unwrap().name_path, "A/m");
        assert_eq!(chunks.iter().find(|c| c.name == "n").unwrap().name_path, "B/n");
    }
}
