//! Health reporting for the embedding service, surfaced by the robustness
//! layer alongside the store's and graph builder's health.
//!
//! Named probe with an `ok`/`fail` outcome and an optional detail message,
//! narrowed to the two domains this service serves plus the shared
//! embedding circuit breaker's state.

use serde::Serialize;

use mnemolite_common::{CircuitBreaker, CircuitSnapshot};

use crate::config::{EmbeddingConfig, EmbeddingMode};
use crate::real::RealBackend;

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingHealth {
    pub mode: &'static str,
    pub text_domain_ok: bool,
    pub code_domain_ok: bool,
    pub circuit: CircuitSnapshot,
    pub detail: Option<String>,
}

/// Probes both domains of a [`RealBackend`] (or reports trivially healthy
/// for mock mode, since it has no external dependency to fail).
pub struct HealthService<'a> {
    config: &'a EmbeddingConfig,
    real: Option<&'a RealBackend>,
    breaker: &'a CircuitBreaker,
}

impl<'a> HealthService<'a> {
    pub fn new(config: &'a EmbeddingConfig, real: Option<&'a RealBackend>, breaker: &'a CircuitBreaker) -> Self {
        Self { config, real, breaker }
    }

    pub async fn check(&self) -> EmbeddingHealth {
        match self.config.mode {
            EmbeddingMode::Mock => EmbeddingHealth {
                mode: "mock",
                text_domain_ok: true,
                code_domain_ok: true,
                circuit: self.breaker.snapshot(),
                detail: None,
            },
            EmbeddingMode::Real => {
                let real = self.real.expect("real mode always constructs a RealBackend");
                let text_domain_ok = real.embed_text("healthcheck").await.is_ok();
                let code_domain_ok = real.embed_code("healthcheck").await.is_ok();
                let detail = if text_domain_ok && code_domain_ok {
                    None
                } else {
                    Some(format!(
                        "probe failed against {} (text_ok={text_domain_ok}, code_ok={code_domain_ok})",
                        self.config.endpoint
                    ))
                };
                EmbeddingHealth {
                    mode: "real",
                    text_domain_ok,
                    code_domain_ok,
                    circuit: self.breaker.snapshot(),
                    detail,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_mode_is_always_healthy() {
        let config = EmbeddingConfig::mock();
        let breaker = CircuitBreaker::for_embedding();
        let health = HealthService::new(&config, None, &breaker).check().await;
        assert!(health.text_domain_ok);
        assert!(health.code_domain_ok);
        assert!(health.detail.is_none());
    }
}
