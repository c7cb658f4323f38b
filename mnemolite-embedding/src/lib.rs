//! Dual Embedding Service: given `(text, domain)`, produces a
//! deterministic, fixed-dimension vector for TEXT, CODE, or both (HYBRID).

pub mod config;
pub mod domain;
pub mod health;
pub mod mock;
pub mod real;
pub mod service;

pub use config::{EmbeddingConfig, EmbeddingMode};
pub use domain::{EMBEDDING_DIM, EmbeddingDomain, EmbeddingResult};
pub use health::{EmbeddingHealth, HealthService};
pub use service::DualEmbeddingService;
