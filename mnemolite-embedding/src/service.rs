//! The Dual Embedding Service's public entry point: `generate(text, domain)`.

use tracing::warn;

use mnemolite_common::{CircuitBreaker, CoreError, Operation, with_timeout};

use crate::config::{EmbeddingConfig, EmbeddingMode};
use crate::domain::{EMBEDDING_DIM, EmbeddingDomain, EmbeddingResult};
use crate::mock;
use crate::real::RealBackend;

enum Salt {
    Text,
    Code,
}

impl Salt {
    fn as_str(&self) -> &'static str {
        match self {
            Salt::Text => "text",
            Salt::Code => "code",
        }
    }
}

pub struct DualEmbeddingService {
    config: EmbeddingConfig,
    real: Option<RealBackend>,
    breaker: CircuitBreaker,
}

impl DualEmbeddingService {
    pub fn new(config: EmbeddingConfig) -> Self {
        let real = match config.mode {
            EmbeddingMode::Real => Some(RealBackend::new(config.clone())),
            EmbeddingMode::Mock => None,
        };
        Self {
            config,
            real,
            breaker: CircuitBreaker::for_embedding(),
        }
    }

    pub fn mock() -> Self {
        Self::new(EmbeddingConfig::mock())
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn real_backend(&self) -> Option<&RealBackend> {
        self.real.as_ref()
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Probes both domains (trivially healthy in mock mode) and reports the
    /// embedding circuit breaker's current state.
    pub async fn health(&self) -> crate::health::EmbeddingHealth {
        crate::health::HealthService::new(&self.config, self.real.as_ref(), &self.breaker).check().await
    }

    /// `HYBRID` attempts both domains and returns whichever succeed; `TEXT`
    /// and `CODE` attempt only the matching one. A domain that is refused by
    /// the real-mode RAM safeguard, or whose circuit is open, degrades to
    /// absent rather than failing the whole call. Only when every requested
    /// domain is absent does this return an error.
    pub async fn generate(&self, text: &str, domain: EmbeddingDomain) -> Result<EmbeddingResult, CoreError> {
        let want_text = matches!(domain, EmbeddingDomain::Text | EmbeddingDomain::Hybrid);
        let want_code = matches!(domain, EmbeddingDomain::Code | EmbeddingDomain::Hybrid);

        let mut result = EmbeddingResult::default();
        if want_text {
            result.text = self.embed_domain(text, Salt::Text).await;
        }
        if want_code {
            result.code = self.embed_domain(text, Salt::Code).await;
        }

        if result.is_empty() {
            return Err(CoreError::InternalInvariantViolated(format!(
                "embedding generation produced no vectors for domain {domain:?}"
            )));
        }
        Ok(result)
    }

    async fn embed_domain(&self, text: &str, salt: Salt) -> Option<Vec<f32>> {
        if text.is_empty() {
            return Some(vec![0.0; EMBEDDING_DIM]);
        }

        match self.config.mode {
            EmbeddingMode::Mock => Some(mock::embed(text, salt.as_str())),
            EmbeddingMode::Real => {
                let real = self.real.as_ref().expect("real mode always constructs a RealBackend");
                let outcome = self
                    .breaker
                    .call(|| async {
                        let timed = with_timeout(Operation::Embedding, None, async {
                            match salt {
                                Salt::Text => real.embed_text(text).await,
                                Salt::Code => real.embed_code(text).await,
                            }
                        })
                        .await;
                        // Flatten the timeout-wrapper Result into the inner
                        // call's Result so the breaker counts both timeouts
                        // and ordinary call failures as failures.
                        match timed {
                            Ok(inner) => inner,
                            Err(timeout_err) => Err(timeout_err),
                        }
                    })
                    .await;

                match outcome {
                    Ok(vector) => Some(vector),
                    Err(err) => {
                        warn!(domain = salt.as_str(), error = %err, "embedding domain degraded to unavailable");
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hybrid_mock_returns_both_keys() {
        let service = DualEmbeddingService::mock();
        let result = service.generate("fn main() {}", EmbeddingDomain::Hybrid).await.unwrap();
        assert!(result.text.is_some());
        assert!(result.code.is_some());
        assert_eq!(result.text.unwrap().len(), EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn text_domain_omits_code_key() {
        let service = DualEmbeddingService::mock();
        let result = service.generate("docstring", EmbeddingDomain::Text).await.unwrap();
        assert!(result.text.is_some());
        assert!(result.code.is_none());
    }

    #[tokio::test]
    async fn empty_input_yields_zero_vector() {
        let service = DualEmbeddingService::mock();
        let result = service.generate("", EmbeddingDomain::Text).await.unwrap();
        assert!(result.text.unwrap().iter().all(|&f| f == 0.0));
    }

    #[tokio::test]
    async fn identical_text_is_deterministic_across_calls() {
        let service = DualEmbeddingService::mock();
        let a = service.generate("same", EmbeddingDomain::Code).await.unwrap();
        let b = service.generate("same", EmbeddingDomain::Code).await.unwrap();
        assert_eq!(a.code, b.code);
    }
}
