//! Parser Registry and the chunk/metadata schema shared by the rest of the
//! core.
//!
//! This crate is deliberately thin: [`registry`] maps a file to a language
//! and a Tree-sitter parse tree (or a recoverable `ParseFailed`), and
//! [`fallback`] provides the fixed-size line-window splitter the Chunker
//! falls back to on parse failure. Parsers here are pure functions on
//! inputs; they hold no cross-call state, so concurrent parsing from many
//! tasks never contends on anything but the OS thread pool.

pub mod chunk;
pub mod fallback;
pub mod registry;

pub use chunk::{ChunkKind, ChunkMetadata, Complexity, CodeChunk};
pub use registry::{ParseOutcome, ParserRegistry};
