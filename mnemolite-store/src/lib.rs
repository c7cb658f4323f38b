//! The Chunk Store: an embedded SQLite persistence layer with FTS5 trigram
//! lexical search and an HNSW vector index, fronted by a three-tier cache
//! (in-process LRU, shared TTL'd, then the store itself).

pub mod cache;
pub mod config;
pub mod record;
pub mod schema;
pub mod store;
pub mod vector;
pub mod vector_text;

pub use cache::ThreeTierCache;
pub use config::StoreConfig;
pub use record::{ChunkFilters, ChunkPatch, ChunkRow, LexicalHit, VectorDomain, VectorHit};
pub use store::ChunkStore;
pub use vector::VectorIndex;
