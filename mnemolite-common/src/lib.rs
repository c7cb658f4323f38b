//! Shared identifiers, language taxonomy, error taxonomy, and robustness
//! primitives used by every other crate in the code intelligence core.
//!
//! Keep this crate free of any component-specific logic (parsing, chunking,
//! storage) — it exists so the rest of the workspace can depend on one small,
//! stable base instead of on each other.

pub mod breaker;
pub mod error;
pub mod ids;
pub mod language;
pub mod span;
pub mod timeout;

pub use breaker::{CircuitBreaker, CircuitSnapshot, CircuitState};
pub use error::CoreError;
pub use language::LanguageTag;
pub use span::Span;
pub use timeout::{Operation, with_timeout};
