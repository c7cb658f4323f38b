//! Metadata Extractor: imports extracted once per file, then per-chunk
//! enrichment (signature, parameters, return type, docstring, decorators,
//! cyclomatic complexity, outbound calls).
//!
//! Walking the AST per-chunk to recompute imports is the pathological
//! O(n²) behavior this module exists to avoid — [`extract_file_imports`] is
//! called exactly once per file and its result threaded into every
//! [`build_metadata`] call for that file.

use mnemolite_parser::{ChunkMetadata, Complexity};
use tree_sitter::Node;

use crate::grammar::LanguageGrammar;

/// Walks the whole file once, collecting the raw text of every import/use
/// statement.
pub fn extract_file_imports(grammar: &LanguageGrammar, source: &str, root: Node) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if grammar.import_kinds.contains(&node.kind()) {
            out.push(source[node.start_byte()..node.end_byte()].trim().to_string());
            continue;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

/// Builds the metadata set for one chunk's backing node. `file_imports` is
/// the pre-extracted, file-wide import list — never recomputed here.
pub fn build_metadata(
    grammar: &LanguageGrammar,
    source: &str,
    node: Node,
    file_imports: &[String],
) -> ChunkMetadata {
    let mut errors = Vec::new();

    let parameters = extract_parameters(grammar, source, node).unwrap_or_else(|| {
        errors.push("parameters: not extractable for this node kind".to_string());
        Vec::new()
    });

    let returns = grammar
        .return_type_field
        .and_then(|f| node.child_by_field_name(f))
        .map(|n| source[n.start_byte()..n.end_byte()].trim().to_string());

    let decorators = extract_decorators(grammar, source, node);
    let docstring = extract_docstring(grammar, source, node);
    let signature = extract_signature(source, node);
    let complexity = Some(count_complexity(grammar, node));
    let calls = extract_calls(grammar, source, node);

    ChunkMetadata {
        signature: Some(signature),
        parameters,
        returns,
        decorators,
        docstring,
        complexity,
        imports: file_imports.to_vec(),
        calls,
        extraction_errors: errors,
        truncated: false,
    }
}

fn extract_parameters(grammar: &LanguageGrammar, source: &str, node: Node) -> Option<Vec<String>> {
    let params = node.child_by_field_name(grammar.parameters_field)?;
    let mut cursor = params.walk();
    Some(
        params
            .named_children(&mut cursor)
            .map(|p| source[p.start_byte()..p.end_byte()].trim().to_string())
            .collect(),
    )
}

fn extract_decorators(grammar: &LanguageGrammar, source: &str, node: Node) -> Vec<String> {
    let Some(kind) = grammar.decorator_kind else {
        return Vec::new();
    };
    let mut out = Vec::new();
    // Decorators in most grammars are modeled either as a preceding sibling
    // (Python's `decorated_definition` wraps the function) or as a direct
    // leading child (Rust's `attribute_item`, Java's `annotation`).
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == kind {
            out.push(source[s.start_byte()..s.end_byte()].trim().to_string());
            sibling = s.prev_sibling();
        } else {
            break;
        }
    }
    out.reverse();
    out
}

fn extract_docstring(grammar: &LanguageGrammar, source: &str, node: Node) -> Option<String> {
    if grammar.python_style_docstring {
        let body = node.child_by_field_name("body")?;
        let mut cursor = body.walk();
        let first = body.named_children(&mut cursor).next()?;
        if first.kind() == "expression_statement" {
            let mut c2 = first.walk();
            let inner = first.named_children(&mut c2).next()?;
            if inner.kind() == "string" {
                return Some(source[inner.start_byte()..inner.end_byte()].trim().to_string());
            }
        }
        return None;
    }

    // Leading comment trivia immediately preceding the node.
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind().contains("comment") {
            lines.push(source[s.start_byte()..s.end_byte()].trim().to_string());
            sibling = s.prev_sibling();
        } else {
            break;
        }
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

/// A single-line rendering of the declaration header: everything from the
/// node's start up to its body (or the whole node if it has none).
fn extract_signature(source: &str, node: Node) -> String {
    let header_end = node
        .child_by_field_name("body")
        .map(|b| b.start_byte())
        .unwrap_or(node.end_byte());
    source[node.start_byte()..header_end]
        .trim()
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim_end_matches(['{', ':'])
        .trim()
        .to_string()
}

fn count_complexity(grammar: &LanguageGrammar, node: Node) -> Complexity {
    let mut decision_points = 0u32;
    let mut lines_of_code = (node.end_position().row - node.start_position().row + 1) as u32;
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        if grammar.decision_kinds.contains(&n.kind()) {
            decision_points += 1;
        }
        let mut cursor = n.walk();
        for child in n.children(&mut cursor) {
            stack.push(child);
        }
    }
    if lines_of_code == 0 {
        lines_of_code = 1;
    }
    Complexity::new(decision_points, lines_of_code)
}

fn extract_calls(grammar: &LanguageGrammar, source: &str, node: Node) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        for (call_kind, callee_field) in grammar.call_kinds {
            if n.kind() == *call_kind {
                if let Some(callee) = n.child_by_field_name(callee_field) {
                    out.push(last_identifier_segment(source, callee));
                }
            }
        }
        let mut cursor = n.walk();
        for child in n.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

/// For a callee expression like `obj.method` or `pkg.Func`, returns the
/// rightmost identifier segment — the syntactic callee name the Graph
/// Builder will later try to resolve.
fn last_identifier_segment(source: &str, node: Node) -> String {
    let mut cursor = node.walk();
    if let Some(last_named) = node.named_children(&mut cursor).last() {
        return last_identifier_segment(source, last_named);
    }
    source[node.start_byte()..node.end_byte()].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::grammar_for;
    use mnemolite_common::LanguageTag;
    use mnemolite_parser::ParserRegistry;

    fn parse(source: &str) -> tree_sitter::Tree {
        match ParserRegistry::parse(LanguageTag::Python, source.as_bytes()) {
            mnemolite_parser::ParseOutcome::Parsed(p) => p.tree,
            _ => panic!("expected successful parse"),
        }
    }

    #[test]
    fn extracts_calls_and_complexity() {
        let source = "def f(xs):\n    if xs:\n        return sum(xs)\n    return 0\n";
        let tree = parse(source);
        let grammar = grammar_for(LanguageTag::Python);
        let root = tree.root_node();
        let func = root.named_child(0).unwrap();
        let meta = build_metadata(grammar, source, func, &[]);
        assert!(meta.calls.contains(&"sum".to_string()));
        assert_eq!(meta.complexity.unwrap().cyclomatic, 2);
    }

    #[test]
    fn imports_extracted_once() {
        let source = "import os\nfrom sys import path\n\ndef f():\n    pass\n";
        let tree = parse(source);
        let grammar = grammar_for(LanguageTag::Python);
        let imports = extract_file_imports(grammar, source, tree.root_node());
        assert_eq!(imports.len(), 2);
    }
}
