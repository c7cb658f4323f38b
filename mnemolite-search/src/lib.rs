//! Hybrid Search: parallel lexical and vector dispatch fused by
//! Reciprocal Rank Fusion, with overfetch, partial-failure degradation, and
//! threshold fallback for vector-only queries.

pub mod filters;
pub mod fusion;
pub mod options;
pub mod response;
pub mod service;

pub use filters::SearchFilters;
pub use fusion::{FusedHit, RankedSource, rrf_fuse};
pub use options::SearchOptions;
pub use response::{SearchHit, SearchResponse};
pub use service::HybridSearchService;
