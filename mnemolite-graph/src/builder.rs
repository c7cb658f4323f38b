//! Graph Builder: turns chunks' `calls`/`imports` metadata into nodes and
//! edges via a three-stage resolver — local, then imported, then
//! best-effort global — filtering language built-ins before an edge is
//! ever created.
//!
//! Resolution runs over the Metadata Extractor's pre-resolved `calls`
//! list rather than a raw signature/docstring text search, and adds
//! import-tracked and best-effort global resolution stages on top of
//! same-file matching.

use std::collections::HashMap;

use mnemolite_common::LanguageTag;
use mnemolite_parser::{ChunkKind, CodeChunk};
use uuid::Uuid;

use crate::model::{Edge, GraphBuildReport, Node, NodeType, RelationType};

/// One repository's built graph plus the diagnostic counters from the
/// build that produced it.
pub struct BuildOutput {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub report: GraphBuildReport,
}

struct FileScope<'a> {
    /// name -> chunk index, for same-file resolution.
    local_names: HashMap<&'a str, usize>,
    /// `name_path` -> chunk index, for disambiguating a same-file bare-name
    /// collision (two methods named the same thing under different
    /// classes) by matching the callee against the tail of a declaration's
    /// qualified path instead of its bare name.
    local_name_paths: Vec<(&'a str, usize)>,
    /// raw import statement text for this file (used only to tell whether
    /// a name was introduced by an import at all; the import-tracked stage
    /// then searches other files for a matching declaration).
    imports: &'a [String],
}

/// Builds nodes and edges for one repository's chunk set. Resolution
/// failures (ambiguous or unresolved callees) are recorded in the report
/// and never roll back the edges that did resolve.
pub fn build_graph(repository: &str, chunks: &[CodeChunk]) -> BuildOutput {
    let mut nodes = Vec::new();
    let mut node_id_by_chunk: HashMap<Uuid, Uuid> = HashMap::new();
    let mut module_node_by_file: HashMap<&str, Uuid> = HashMap::new();
    let mut report = GraphBuildReport::default();

    // Stage 0: one node per callable chunk, plus one module node per file
    // (anchors `imports` edges even for files with no callable chunk).
    for c in chunks {
        if c.is_callable_kind() {
            let node = make_node(repository, c);
            node_id_by_chunk.insert(c.id, node.id);
            nodes.push(node);
        }
    }
    for c in chunks {
        module_node_by_file.entry(c.file_path.as_str()).or_insert_with(|| {
            let id = mnemolite_common::ids::node_id(mnemolite_common::ids::chunk_id(
                repository,
                &c.file_path,
                0,
                0,
                "__module__",
            ));
            nodes.push(Node {
                id,
                repository: repository.to_string(),
                node_type: NodeType::Module,
                label: c.file_path.clone(),
                properties: HashMap::from([("file_path".to_string(), c.file_path.clone())]),
            });
            id
        });
    }
    report.nodes_created = nodes.len();

    // name -> (file_path, chunk index) for best-effort global resolution,
    // tracking ambiguity (more than one distinct declaration under the
    // same short name anywhere in the repository).
    let mut global_by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, c) in chunks.iter().enumerate() {
        if c.is_callable_kind() {
            global_by_name.entry(c.name.as_str()).or_default().push(i);
        }
    }

    let mut by_file: HashMap<&str, FileScope> = HashMap::new();
    for (file, group) in &group_by_file(chunks) {
        let mut local_names = HashMap::new();
        let mut local_name_paths = Vec::new();
        for &i in group {
            if chunks[i].is_callable_kind() {
                local_names.insert(chunks[i].name.as_str(), i);
                local_name_paths.push((chunks[i].name_path.as_str(), i));
            }
        }
        by_file.insert(file, FileScope {
            local_names,
            local_name_paths,
            imports: &[],
        });
    }
    // Imports are file-scoped metadata already carried on every chunk in
    // the file (the Metadata Extractor copies the same list into each
    // chunk); take it from the first chunk seen per file.
    let imports_by_file: HashMap<&str, &[String]> = chunks
        .iter()
        .map(|c| (c.file_path.as_str(), c.metadata.imports.as_slice()))
        .collect();
    for (file, scope) in by_file.iter_mut() {
        if let Some(imports) = imports_by_file.get(file) {
            scope.imports = imports;
        }
    }

    let mut edges: Vec<Edge> = Vec::new();
    let mut seen_edges: std::collections::HashSet<(Uuid, Uuid, RelationType)> = std::collections::HashSet::new();

    for c in chunks {
        if !c.is_callable_kind() {
            continue;
        }
        let Some(&source_node) = node_id_by_chunk.get(&c.id) else { continue };
        let scope = by_file.get(c.file_path.as_str());
        let builtins = c.language.builtin_names();

        for callee in &c.metadata.calls {
            if builtins.contains(&callee.as_str()) {
                report.calls_filtered_builtin += 1;
                continue;
            }

            let (target_idx, strategy) = match resolve_callee(callee, c, scope, &global_by_name, chunks) {
                Resolution::Resolved(idx, strategy) => (idx, strategy),
                Resolution::Ambiguous => {
                    report.calls_ambiguous += 1;
                    continue;
                }
                Resolution::Unresolved => {
                    report.calls_unresolved += 1;
                    continue;
                }
            };
            match strategy {
                "local" => report.calls_resolved_local += 1,
                "imported" => report.calls_resolved_imported += 1,
                _ => report.calls_resolved_global += 1,
            }

            let Some(&target_node) = node_id_by_chunk.get(&chunks[target_idx].id) else { continue };
            // A self-edge here always reflects literal recursion: the
            // resolver only ever returns the caller's own chunk when the
            // caller's own name is the (unique) match for the callee.
            let key = (source_node, target_node, RelationType::Calls);
            if !seen_edges.insert(key) {
                continue;
            }
            edges.push(Edge {
                source_node_id: source_node,
                target_node_id: target_node,
                relation_type: RelationType::Calls,
                properties: HashMap::from([("resolution".to_string(), strategy.to_string())]),
            });
        }
    }

    // `imports`-typed edges: importer file's module node -> imported
    // file's module node, when both exist in this repository.
    for (file, scope) in &by_file {
        let Some(&source_module) = module_node_by_file.get(file) else { continue };
        for raw_import in scope.imports {
            for (&other_file, &target_module) in &module_node_by_file {
                if other_file == *file {
                    continue;
                }
                if import_references_file(raw_import, other_file) {
                    let key = (source_module, target_module, RelationType::Imports);
                    if seen_edges.insert(key) {
                        edges.push(Edge {
                            source_node_id: source_module,
                            target_node_id: target_module,
                            relation_type: RelationType::Imports,
                            properties: HashMap::new(),
                        });
                    }
                }
            }
        }
    }

    report.edges_created = edges.len();
    BuildOutput { nodes, edges, report }
}

fn make_node(repository: &str, c: &CodeChunk) -> Node {
    let node_type = match c.kind {
        ChunkKind::Function => NodeType::Function,
        ChunkKind::Method => NodeType::Method,
        ChunkKind::Class => NodeType::Class,
        ChunkKind::Module => NodeType::Module,
    };
    Node {
        id: mnemolite_common::ids::node_id(c.id),
        repository: repository.to_string(),
        node_type,
        label: c.name.clone(),
        properties: HashMap::from([
            ("chunk_id".to_string(), c.id.to_string()),
            ("file_path".to_string(), c.file_path.clone()),
            ("name_path".to_string(), c.name_path.clone()),
        ]),
    }
}

fn group_by_file(chunks: &[CodeChunk]) -> HashMap<&str, Vec<usize>> {
    let mut out: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, c) in chunks.iter().enumerate() {
        out.entry(c.file_path.as_str()).or_default().push(i);
    }
    out
}

enum Resolution {
    Resolved(usize, &'static str),
    Ambiguous,
    Unresolved,
}

/// Three-stage resolver: local (same file, matching short name or
/// `name_path` suffix) > imported (a name introduced by an import in this
/// file that matches a declaration in another file) > best-effort global
/// (unique short name across the repository). Ambiguous global matches are
/// discarded, not guessed at.
fn resolve_callee(
    callee: &str,
    caller: &CodeChunk,
    scope: Option<&FileScope>,
    global_by_name: &HashMap<&str, Vec<usize>>,
    chunks: &[CodeChunk],
) -> Resolution {
    if let Some(scope) = scope {
        if let Some(&idx) = scope.local_names.get(callee) {
            return Resolution::Resolved(idx, "local");
        }
        let suffix = format!("/{callee}");
        if let Some(&(_, idx)) = scope.local_name_paths.iter().find(|(path, _)| path.ends_with(&suffix)) {
            return Resolution::Resolved(idx, "local");
        }
    }

    if let Some(scope) = scope {
        let imported = scope.imports.iter().any(|i| i.contains(callee));
        if imported {
            if let Some(candidates) = global_by_name.get(callee) {
                let other_file: Vec<&usize> = candidates
                    .iter()
                    .filter(|&&i| chunks[i].file_path != caller.file_path)
                    .collect();
                if other_file.len() == 1 {
                    return Resolution::Resolved(*other_file[0], "imported");
                }
            }
        }
    }

    match global_by_name.get(callee) {
        Some(candidates) if candidates.len() == 1 => Resolution::Resolved(candidates[0], "global"),
        Some(candidates) if candidates.len() > 1 => Resolution::Ambiguous,
        _ => Resolution::Unresolved,
    }
}

/// Whether a raw import statement's text plausibly references `other_file`
/// (by stem, since import syntax varies per language and the Metadata
/// Extractor only hands us the statement's source text).
fn import_references_file(raw_import: &str, other_file: &str) -> bool {
    let stem = std::path::Path::new(other_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(other_file);
    !stem.is_empty() && raw_import.contains(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_common::Span;
    use mnemolite_parser::ChunkMetadata;

    fn chunk(name: &str, file: &str, calls: Vec<&str>) -> CodeChunk {
        CodeChunk {
            id: Uuid::new_v4(),
            repository: "repo".to_string(),
            file_path: file.to_string(),
            span: Span::new(1, 1, 0, 10),
            kind: ChunkKind::Function,
            text: String::new(),
            name: name.to_string(),
            name_path: name.to_string(),
            language: LanguageTag::Python,
            metadata: ChunkMetadata {
                calls: calls.into_iter().map(String::from).collect(),
                ..Default::default()
            },
            embedding_text: None,
            embedding_code: None,
            commit_hash: None,
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn resolves_local_call_before_global() {
        let chunks = vec![chunk("a", "x.py", vec!["b"]), chunk("b", "x.py", vec![])];
        let out = build_graph("repo", &chunks);
        assert_eq!(out.report.calls_resolved_local, 1);
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].properties.get("resolution").unwrap(), "local");
    }

    #[test]
    fn filters_builtin_callees() {
        let chunks = vec![chunk("a", "x.py", vec!["print", "len"])];
        let out = build_graph("repo", &chunks);
        assert_eq!(out.report.calls_filtered_builtin, 2);
        assert!(out.edges.is_empty());
    }

    #[test]
    fn ambiguous_global_callee_is_discarded() {
        let chunks = vec![
            chunk("a", "x.py", vec!["helper"]),
            chunk("helper", "y.py", vec![]),
            chunk("helper", "z.py", vec![]),
        ];
        let out = build_graph("repo", &chunks);
        assert_eq!(out.report.calls_ambiguous + out.report.calls_unresolved, 1);
        assert!(out.edges.is_empty());
    }

    #[test]
    fn duplicate_calls_produce_one_edge() {
        let chunks = vec![chunk("a", "x.py", vec!["b", "b"]), chunk("b", "x.py", vec![])];
        let out = build_graph("repo", &chunks);
        assert_eq!(out.edges.len(), 1);
    }

    fn chunk_with_path(name: &str, name_path: &str, file: &str, language: LanguageTag, calls: Vec<&str>) -> CodeChunk {
        let mut c = chunk(name, file, calls);
        c.name_path = name_path.to_string();
        c.language = language;
        c
    }

    /// Two methods sharing a bare name under different classes in the same
    /// file: the exact bare-name lookup resolves to whichever chunk the
    /// `HashMap` insert kept, but the `name_path` suffix match still lets
    /// the caller that qualifies through its own class reach its sibling's
    /// same-named method rather than silently falling through to global.
    #[test]
    fn name_path_suffix_resolves_same_file_bare_name_collision() {
        let chunks = vec![
            chunk_with_path("caller", "Caller/caller", "x.py", LanguageTag::Python, vec!["run"]),
            chunk_with_path("run", "Caller/run", "x.py", LanguageTag::Python, vec![]),
            chunk_with_path("run", "Other/run", "x.py", LanguageTag::Python, vec![]),
        ];
        let out = build_graph("repo", &chunks);
        assert_eq!(out.edges.len(), 1, "suffix match must resolve despite the bare-name collision");
        assert_eq!(out.edges[0].properties.get("resolution").unwrap(), "local");
    }

    /// Built-in filtering must use each chunk's own `language`, not the
    /// first chunk's, when a repository mixes languages.
    #[test]
    fn builtin_filtering_uses_each_chunks_own_language() {
        let chunks = vec![
            chunk_with_path("f", "f", "a.py", LanguageTag::Python, vec!["print"]),
            chunk_with_path("g", "g", "b.go", LanguageTag::Go, vec!["println"]),
        ];
        let out = build_graph("repo", &chunks);
        assert_eq!(out.report.calls_filtered_builtin, 2);
        assert!(out.edges.is_empty());
    }
}
