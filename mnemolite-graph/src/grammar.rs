//! Per-language grammar tables: the mapping from Tree-sitter node kinds to
//! chunk kinds, import statements, call expressions, and decision points.
//!
//! Adding a language means adding one `LanguageGrammar` here plus a built-in
//! filter list in `mnemolite_common::LanguageTag::builtin_names` — the rest
//! of the Chunker, Metadata Extractor and Graph Builder are grammar-agnostic.

use mnemolite_common::LanguageTag;
use mnemolite_parser::ChunkKind as GrammarChunkKind;

/// One mapping entry: a Tree-sitter node kind string to the chunk kind it
/// produces, and whether that kind nests as a `Method` when its direct
/// structural parent is a class-like node (vs. `Function` at top level).
pub struct ChunkRule {
    pub node_kind: &'static str,
    pub kind_if_nested: GrammarChunkKind,
    pub kind_if_top_level: GrammarChunkKind,
}

pub struct LanguageGrammar {
    pub language: LanguageTag,
    /// Node kinds that become chunk candidates, and which chunk kind they
    /// map to depending on nesting under a class-like node.
    pub chunk_rules: &'static [ChunkRule],
    /// Node kinds that are themselves class-like containers (their presence
    /// as an ancestor turns a nested function/method rule into `Method`).
    pub class_like_kinds: &'static [&'static str],
    /// Node kinds representing import/use statements.
    pub import_kinds: &'static [&'static str],
    /// Node kinds representing a call expression; `callee_field` names the
    /// child field holding the callee expression.
    pub call_kinds: &'static [(&'static str, &'static str)],
    /// Node kinds counted as cyclomatic decision points.
    pub decision_kinds: &'static [&'static str],
    /// The tree-sitter field name holding a declaration's identifier.
    pub name_field: &'static str,
    /// Field name holding the parameter list, uniform across these six
    /// grammars.
    pub parameters_field: &'static str,
    /// Field name holding the return type annotation, if the grammar
    /// distinguishes one.
    pub return_type_field: Option<&'static str>,
    /// Node kind for a decorator/annotation attached to a declaration.
    pub decorator_kind: Option<&'static str>,
    /// Whether docstrings are the first string-literal statement in the
    /// body (Python) rather than a leading comment.
    pub python_style_docstring: bool,
}

use GrammarChunkKind::{Class, Function, Method};

const PYTHON: LanguageGrammar = LanguageGrammar {
    language: LanguageTag::Python,
    chunk_rules: &[
        ChunkRule { node_kind: "function_definition", kind_if_nested: Method, kind_if_top_level: Function },
        ChunkRule { node_kind: "class_definition", kind_if_nested: Class, kind_if_top_level: Class },
    ],
    class_like_kinds: &["class_definition"],
    import_kinds: &["import_statement", "import_from_statement"],
    call_kinds: &[("call", "function")],
    decision_kinds: &[
        "if_statement", "elif_clause", "for_statement", "while_statement",
        "except_clause", "with_statement", "boolean_operator", "conditional_expression",
    ],
    name_field: "name",
    parameters_field: "parameters",
    return_type_field: Some("return_type"),
    decorator_kind: Some("decorator"),
    python_style_docstring: true,
};

const JAVASCRIPT: LanguageGrammar = LanguageGrammar {
    language: LanguageTag::JavaScript,
    chunk_rules: &[
        ChunkRule { node_kind: "function_declaration", kind_if_nested: Method, kind_if_top_level: Function },
        ChunkRule { node_kind: "method_definition", kind_if_nested: Method, kind_if_top_level: Method },
        ChunkRule { node_kind: "class_declaration", kind_if_nested: Class, kind_if_top_level: Class },
    ],
    class_like_kinds: &["class_declaration", "class"],
    import_kinds: &["import_statement"],
    call_kinds: &[("call_expression", "function")],
    decision_kinds: &[
        "if_statement", "for_statement", "for_in_statement", "while_statement",
        "do_statement", "switch_case", "catch_clause", "ternary_expression",
    ],
    name_field: "name",
    parameters_field: "parameters",
    return_type_field: None,
    decorator_kind: Some("decorator"),
    python_style_docstring: false,
};

const TYPESCRIPT: LanguageGrammar = LanguageGrammar {
    language: LanguageTag::TypeScript,
    chunk_rules: JAVASCRIPT.chunk_rules,
    class_like_kinds: JAVASCRIPT.class_like_kinds,
    import_kinds: JAVASCRIPT.import_kinds,
    call_kinds: JAVASCRIPT.call_kinds,
    decision_kinds: JAVASCRIPT.decision_kinds,
    name_field: "name",
    parameters_field: "parameters",
    return_type_field: Some("return_type"),
    decorator_kind: Some("decorator"),
    python_style_docstring: false,
};

const GO: LanguageGrammar = LanguageGrammar {
    language: LanguageTag::Go,
    chunk_rules: &[
        ChunkRule { node_kind: "function_declaration", kind_if_nested: Function, kind_if_top_level: Function },
        ChunkRule { node_kind: "method_declaration", kind_if_nested: Method, kind_if_top_level: Method },
        ChunkRule { node_kind: "type_declaration", kind_if_nested: Class, kind_if_top_level: Class },
    ],
    class_like_kinds: &["type_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &[("call_expression", "function")],
    decision_kinds: &[
        "if_statement", "for_statement", "expression_switch_statement",
        "type_switch_statement", "communication_case",
    ],
    name_field: "name",
    parameters_field: "parameters",
    return_type_field: Some("result"),
    decorator_kind: None,
    python_style_docstring: false,
};

const RUST: LanguageGrammar = LanguageGrammar {
    language: LanguageTag::Rust,
    chunk_rules: &[
        ChunkRule { node_kind: "function_item", kind_if_nested: Method, kind_if_top_level: Function },
        ChunkRule { node_kind: "struct_item", kind_if_nested: Class, kind_if_top_level: Class },
        ChunkRule { node_kind: "enum_item", kind_if_nested: Class, kind_if_top_level: Class },
        ChunkRule { node_kind: "trait_item", kind_if_nested: Class, kind_if_top_level: Class },
        ChunkRule { node_kind: "impl_item", kind_if_nested: Class, kind_if_top_level: Class },
    ],
    class_like_kinds: &["impl_item", "trait_item"],
    import_kinds: &["use_declaration"],
    call_kinds: &[("call_expression", "function")],
    decision_kinds: &[
        "if_expression", "if_let_expression", "while_expression", "while_let_expression",
        "loop_expression", "match_arm", "try_expression",
    ],
    name_field: "name",
    parameters_field: "parameters",
    return_type_field: Some("return_type"),
    decorator_kind: Some("attribute_item"),
    python_style_docstring: false,
};

const JAVA: LanguageGrammar = LanguageGrammar {
    language: LanguageTag::Java,
    chunk_rules: &[
        ChunkRule { node_kind: "method_declaration", kind_if_nested: Method, kind_if_top_level: Method },
        ChunkRule { node_kind: "constructor_declaration", kind_if_nested: Method, kind_if_top_level: Method },
        ChunkRule { node_kind: "class_declaration", kind_if_nested: Class, kind_if_top_level: Class },
        ChunkRule { node_kind: "interface_declaration", kind_if_nested: Class, kind_if_top_level: Class },
    ],
    class_like_kinds: &["class_declaration", "interface_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &[("method_invocation", "name")],
    decision_kinds: &[
        "if_statement", "for_statement", "while_statement", "do_statement",
        "switch_label", "catch_clause", "ternary_expression",
    ],
    name_field: "name",
    parameters_field: "parameters",
    return_type_field: Some("type"),
    decorator_kind: Some("annotation"),
    python_style_docstring: false,
};

pub fn grammar_for(language: LanguageTag) -> &'static LanguageGrammar {
    match language {
        LanguageTag::Python => &PYTHON,
        LanguageTag::JavaScript => &JAVASCRIPT,
        LanguageTag::TypeScript => &TYPESCRIPT,
        LanguageTag::Go => &GO,
        LanguageTag::Rust => &RUST,
        LanguageTag::Java => &JAVA,
    }
}
