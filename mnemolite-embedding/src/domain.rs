//! The embedding domain enum and the service's result shape.

use serde::{Deserialize, Serialize};

/// Fixed vector width for both the TEXT and CODE embedding spaces.
pub const EMBEDDING_DIM: usize = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingDomain {
    Text,
    Code,
    Hybrid,
}

/// `HYBRID` returns both keys; `TEXT`/`CODE` return only the matching one.
/// Never empty — an embedding call that would produce neither key is an
/// error, not an empty `EmbeddingResult`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub text: Option<Vec<f32>>,
    pub code: Option<Vec<f32>>,
}

impl EmbeddingResult {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.code.is_none()
    }
}
