//! Embedding service configuration, built from environment variables.
//!
//! Grounded on `RagConfig::from_env`/`validate` — required fields fail
//! fast with a descriptive `CoreError::InvalidInput`, optional fields fall
//! back to documented defaults.

use mnemolite_common::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// HTTP calls to a local embedding server (Ollama-compatible
    /// `/api/embeddings`), lazily connected under a double-checked lock.
    Real,
    /// Deterministic hash-based pseudo-embeddings; no network calls.
    Mock,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub endpoint: String,
    pub text_model: String,
    pub code_model: String,
    pub timeout_secs: u64,
    /// Refuses loading a second real-mode model once projected resident
    /// memory would exceed this budget; the measured CPU-build multiplier
    /// is documented as ≈2.5× model weights at rest.
    pub max_resident_mb: u64,
}

impl EmbeddingConfig {
    /// Recognized vars:
    /// - `EMBEDDING_MODE` = `real`|`mock` (default: `mock`)
    /// - `EMBEDDING_ENDPOINT` (required if `real`)
    /// - `EMBEDDING_TEXT_MODEL`, `EMBEDDING_CODE_MODEL` (required if `real`)
    /// - `EMBEDDING_TIMEOUT_SECS` (default: 10, per the Dual Embedding
    ///   Service's per-call timeout)
    /// - `EMBEDDING_MAX_RESIDENT_MB` (default: 4096)
    pub fn from_env() -> Result<Self, CoreError> {
        use std::env;

        let mode = match env::var("EMBEDDING_MODE").unwrap_or_else(|_| "mock".into()).as_str() {
            "real" => EmbeddingMode::Real,
            "mock" | "" => EmbeddingMode::Mock,
            other => {
                return Err(CoreError::invalid_input(format!(
                    "unknown EMBEDDING_MODE: {other}"
                )));
            }
        };

        let endpoint = env::var("EMBEDDING_ENDPOINT").unwrap_or_else(|_| "http://localhost:11434".into());
        let text_model = env::var("EMBEDDING_TEXT_MODEL").unwrap_or_else(|_| "nomic-embed-text".into());
        let code_model = env::var("EMBEDDING_CODE_MODEL").unwrap_or_else(|_| "nomic-embed-code".into());

        let timeout_secs = env::var("EMBEDDING_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let max_resident_mb = env::var("EMBEDDING_MAX_RESIDENT_MB")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(4096);

        let cfg = Self {
            mode,
            endpoint,
            text_model,
            code_model,
            timeout_secs,
            max_resident_mb,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.mode == EmbeddingMode::Real {
            if self.endpoint.trim().is_empty()
                || !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://"))
            {
                return Err(CoreError::invalid_input("EMBEDDING_ENDPOINT must start with http:// or https://"));
            }
            if self.text_model.trim().is_empty() || self.code_model.trim().is_empty() {
                return Err(CoreError::invalid_input("EMBEDDING_TEXT_MODEL and EMBEDDING_CODE_MODEL must not be empty"));
            }
        }
        if self.max_resident_mb == 0 {
            return Err(CoreError::invalid_input("EMBEDDING_MAX_RESIDENT_MB must be > 0"));
        }
        Ok(())
    }

    pub fn mock() -> Self {
        Self {
            mode: EmbeddingMode::Mock,
            endpoint: String::new(),
            text_model: String::new(),
            code_model: String::new(),
            timeout_secs: 10,
            max_resident_mb: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_config_is_always_valid() {
        assert!(EmbeddingConfig::mock().validate().is_ok());
    }

    #[test]
    fn real_mode_requires_http_endpoint() {
        let mut cfg = EmbeddingConfig::mock();
        cfg.mode = EmbeddingMode::Real;
        cfg.endpoint = "not-a-url".into();
        assert!(cfg.validate().is_err());
    }
}
