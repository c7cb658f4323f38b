//! Real embedding backend: HTTP calls to a local, Ollama-compatible
//! embedding server.
//!
//! `POST {endpoint}/api/embeddings`, `{model, input} -> {embedding:
//! number[]}`, one model per domain, loaded lazily under a double-checked
//! lock with a RAM safeguard: each domain's client is connected at most
//! once per process, and a second domain's connection is refused once
//! projected resident memory would exceed the configured budget.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use mnemolite_common::CoreError;

use crate::config::EmbeddingConfig;
use crate::domain::EMBEDDING_DIM;

/// The original port's CPU-build measurement: a loaded model occupies
/// roughly 2.5x its weight size resident. Used only to size the
/// per-domain budget charge against `max_resident_mb`; this crate never
/// loads weights itself (that happens server-side), but the safeguard
/// still governs how many *domains* this process will keep connected.
const RESIDENT_MULTIPLIER_PCT: u64 = 250;
/// Placeholder per-domain weight estimate in MB, used only to size the
/// budget charge — this process holds no weights itself.
const ASSUMED_MODEL_WEIGHT_MB: u64 = 700;

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(alias = "embedding")]
    embedding: Vec<f32>,
}

struct LoadedDomain {
    client: reqwest::Client,
    url: String,
    model: String,
}

/// Lazily connects one HTTP client per domain (TEXT, CODE), under a
/// double-checked lock (`OnceCell::get_or_try_init`), subject to a shared
/// RAM safeguard across both domains.
pub struct RealBackend {
    config: EmbeddingConfig,
    text: OnceCell<LoadedDomain>,
    code: OnceCell<LoadedDomain>,
    projected_resident_mb: AtomicU64,
}

impl RealBackend {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            text: OnceCell::new(),
            code: OnceCell::new(),
            projected_resident_mb: AtomicU64::new(0),
        }
    }

    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        let domain = self
            .text
            .get_or_try_init(|| self.load(&self.config.text_model))
            .await?;
        self.call(domain, text).await
    }

    pub async fn embed_code(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        let domain = self
            .code
            .get_or_try_init(|| self.load(&self.config.code_model))
            .await?;
        self.call(domain, text).await
    }

    async fn load(&self, model: &str) -> Result<LoadedDomain, CoreError> {
        let charge = ASSUMED_MODEL_WEIGHT_MB * RESIDENT_MULTIPLIER_PCT / 100;
        let projected = self.projected_resident_mb.fetch_add(charge, Ordering::SeqCst) + charge;
        if projected > self.config.max_resident_mb {
            self.projected_resident_mb.fetch_sub(charge, Ordering::SeqCst);
            return Err(CoreError::unavailable(
                "embedding model",
                format!(
                    "refusing to load `{model}`: projected resident {projected}MB exceeds budget {}MB",
                    self.config.max_resident_mb
                ),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| CoreError::invalid_input(format!("failed to build embedding HTTP client: {e}")))?;

        let url = format!("{}/api/embeddings", self.config.endpoint.trim_end_matches('/'));
        Ok(LoadedDomain { client, url, model: model.to_string() })
    }

    async fn call(&self, domain: &LoadedDomain, text: &str) -> Result<Vec<f32>, CoreError> {
        let body = EmbeddingsRequest { model: &domain.model, input: text };
        let resp = domain
            .client
            .post(&domain.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::unavailable("embedding server", format!("transport error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(CoreError::unavailable(
                "embedding server",
                format!("returned HTTP {status} from {}", domain.url),
            ));
        }

        let decoded: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::unavailable("embedding server", format!("failed to decode response: {e}")))?;

        if decoded.embedding.len() != EMBEDDING_DIM {
            return Err(CoreError::unavailable(
                "embedding server",
                format!("returned {} dims, expected {EMBEDDING_DIM}", decoded.embedding.len()),
            ));
        }
        Ok(decoded.embedding)
    }
}
