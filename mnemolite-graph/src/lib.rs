//! Chunker, Metadata Extractor, Symbol Path Builder, Graph Builder and
//! Graph Traversal: everything downstream of a successful parse.

pub mod builder;
pub mod chunker;
pub mod grammar;
pub mod metadata;
pub mod model;
pub mod symbols;
pub mod traversal;

pub use builder::{BuildOutput, build_graph};
pub use chunker::{ChunkerConfig, chunk_tree};
pub use grammar::{ChunkRule, LanguageGrammar, grammar_for};
pub use model::{Edge, GraphBuildReport, GraphStats, Node, NodeType, RelationType};
pub use symbols::assign_name_paths;
pub use traversal::{DEFAULT_MAX_DEPTH, Direction, GraphView, Reached};
