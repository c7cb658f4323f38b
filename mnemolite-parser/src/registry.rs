//! Language detection and Tree-sitter dispatch.
//!
//! `detect_language` and `parse` are pure functions on their inputs: no
//! shared state survives between calls, so the registry needs no
//! construction beyond a zero-sized marker type.

use std::path::Path;

use mnemolite_common::{CoreError, LanguageTag};
use tracing::{debug, warn};
use tree_sitter::{Parser, Tree};

/// A successfully parsed file: its language, the parse tree, and the
/// original source text the tree's byte ranges index into.
pub struct ParsedFile {
    pub language: LanguageTag,
    pub tree: Tree,
    pub source: String,
}

/// The result of attempting to parse a file. `ParseFailed` is recoverable —
/// callers (the Chunker) fall back to fixed-size splitting rather than
/// aborting the file.
pub enum ParseOutcome {
    Parsed(ParsedFile),
    Failed {
        language: Option<LanguageTag>,
        reason: String,
    },
}

pub struct ParserRegistry;

impl ParserRegistry {
    /// Detects a file's language by extension, falling back to a content
    /// sniff for ambiguous or missing extensions.
    pub fn detect_language(path: &Path, bytes: &[u8]) -> Result<LanguageTag, CoreError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if let Some(lang) = LanguageTag::from_extension(&ext) {
            return Ok(lang);
        }

        if let Some(lang) = LanguageTag::from_content_sniff(bytes) {
            debug!(path = %path.display(), ?lang, "language detected by content sniff");
            return Ok(lang);
        }

        Err(CoreError::InvalidInput(format!(
            "unknown language for {}",
            path.display()
        )))
    }

    /// Parses `bytes` as `lang`, wrapping tree-sitter's own failure modes
    /// (grammar mismatch, degenerate parse) into a recoverable
    /// `ParseOutcome::Failed`. Never panics on malformed input.
    pub fn parse(lang: LanguageTag, bytes: &[u8]) -> ParseOutcome {
        let source = match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(e) => {
                return ParseOutcome::Failed {
                    language: Some(lang),
                    reason: format!("invalid utf-8: {e}"),
                };
            }
        };

        let mut parser = Parser::new();
        if let Err(e) = set_language(&mut parser, lang) {
            warn!(?lang, error = %e, "failed to initialize grammar");
            return ParseOutcome::Failed {
                language: Some(lang),
                reason: e,
            };
        }

        match parser.parse(&source, None) {
            Some(tree) => {
                if tree.root_node().has_error() {
                    // Tree-sitter performs error recovery and still returns a
                    // tree; a root-level error means the file is malformed
                    // enough that structural chunking would be unreliable.
                    warn!(?lang, "parse tree contains errors; treating as parse failure");
                    return ParseOutcome::Failed {
                        language: Some(lang),
                        reason: "parse tree contains syntax errors".to_string(),
                    };
                }
                ParseOutcome::Parsed(ParsedFile {
                    language: lang,
                    tree,
                    source,
                })
            }
            None => ParseOutcome::Failed {
                language: Some(lang),
                reason: "tree-sitter returned no tree".to_string(),
            },
        }
    }
}

fn set_language(parser: &mut Parser, lang: LanguageTag) -> Result<(), String> {
    let language = match lang {
        LanguageTag::Rust => tree_sitter_rust::LANGUAGE.into(),
        LanguageTag::Python => tree_sitter_python::LANGUAGE.into(),
        LanguageTag::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        LanguageTag::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        LanguageTag::Go => tree_sitter_go::LANGUAGE.into(),
        LanguageTag::Java => tree_sitter_java::LANGUAGE.into(),
    };
    parser
        .set_language(&language)
        .map_err(|e| format!("set_language failed for {lang}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_rust_by_extension() {
        let path = PathBuf::from("lib.rs");
        let lang = ParserRegistry::detect_language(&path, b"fn main() {}").unwrap();
        assert_eq!(lang, LanguageTag::Rust);
    }

    #[test]
    fn unknown_extension_errors() {
        let path = PathBuf::from("data.unknownext");
        let result = ParserRegistry::detect_language(&path, b"???");
        assert!(result.is_err());
    }

    #[test]
    fn parses_well_formed_python() {
        let outcome = ParserRegistry::parse(LanguageTag::Python, b"def add(a, b):\n    return a + b\n");
        assert!(matches!(outcome, ParseOutcome::Parsed(_)));
    }

    #[test]
    fn malformed_source_fails_recoverably() {
        let outcome = ParserRegistry::parse(LanguageTag::Python, b"def add(a, b:\n    return a +\n");
        assert!(matches!(outcome, ParseOutcome::Failed { .. }));
    }
}
