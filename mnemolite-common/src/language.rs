//! Language taxonomy and extension/content-based detection.
//!
//! This module is intentionally free of Tree-sitter grammar coupling; the
//! mapping from a `LanguageTag` to a concrete grammar lives in
//! `mnemolite-parser`. Keep the set tight — adding a language here requires a
//! corresponding grammar, chunk-kind mapping, name/path rule and built-in
//! filter list in the parser and graph crates.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The minimum viable language set named by the core specification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Java,
}

impl Display for LanguageTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LanguageTag::Python => "python",
            LanguageTag::JavaScript => "javascript",
            LanguageTag::TypeScript => "typescript",
            LanguageTag::Go => "go",
            LanguageTag::Rust => "rust",
            LanguageTag::Java => "java",
        })
    }
}

impl LanguageTag {
    /// Best-effort detection by file extension. Returns `None` for unknown
    /// extensions; callers fall back to a content sniff or treat the file as
    /// opaque text.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let e = ext.to_ascii_lowercase();
        match e.as_str() {
            "py" | "pyi" => Some(Self::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "java" => Some(Self::Java),
            _ => None,
        }
    }

    /// Content-sniff fallback for ambiguous or missing extensions. Looks for
    /// a handful of unambiguous leading tokens; anything else remains
    /// undetected.
    pub fn from_content_sniff(bytes: &[u8]) -> Option<Self> {
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
        if head.starts_with("#!/usr/bin/env python") || head.starts_with("#!/usr/bin/python") {
            return Some(Self::Python);
        }
        if head.starts_with("#!/usr/bin/env node") {
            return Some(Self::JavaScript);
        }
        if head.contains("package main") && head.contains("func ") {
            return Some(Self::Go);
        }
        if head.contains("fn main(") && head.contains("::") {
            return Some(Self::Rust);
        }
        None
    }

    /// Static set of per-language built-in names that must never become
    /// graph call edges, per the Graph Builder's built-in filtering rule.
    pub fn builtin_names(self) -> &'static [&'static str] {
        match self {
            LanguageTag::Python => &[
                "print", "len", "range", "isinstance", "str", "int", "float", "list", "dict",
                "set", "tuple", "bool", "enumerate", "zip", "map", "filter", "sorted", "sum",
                "min", "max", "abs", "open", "super", "type", "repr", "hasattr", "getattr",
                "setattr", "iter", "next",
            ],
            LanguageTag::JavaScript | LanguageTag::TypeScript => &[
                "console", "parseInt", "parseFloat", "isNaN", "isFinite", "require", "Array",
                "Object", "String", "Number", "Boolean", "Promise", "Map", "Set", "JSON",
                "Math", "setTimeout", "setInterval", "encodeURIComponent", "decodeURIComponent",
            ],
            LanguageTag::Go => &[
                "print", "println", "len", "cap", "make", "new", "append", "copy", "delete",
                "panic", "recover", "close", "complex", "real", "imag",
            ],
            LanguageTag::Rust => &[
                "println", "print", "eprintln", "eprint", "format", "vec", "panic", "assert",
                "assert_eq", "assert_ne", "matches", "unreachable", "todo", "unimplemented",
                "dbg",
            ],
            LanguageTag::Java => &[
                "println", "print", "toString", "equals", "hashCode", "getClass", "length",
                "size", "valueOf",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(LanguageTag::from_extension("py"), Some(LanguageTag::Python));
        assert_eq!(LanguageTag::from_extension("tsx"), Some(LanguageTag::TypeScript));
        assert_eq!(LanguageTag::from_extension("go"), Some(LanguageTag::Go));
        assert_eq!(LanguageTag::from_extension("weird"), None);
    }

    #[test]
    fn builtin_names_filter_print() {
        assert!(LanguageTag::Python.builtin_names().contains(&"print"));
        assert!(LanguageTag::Python.builtin_names().contains(&"sum"));
    }
}
