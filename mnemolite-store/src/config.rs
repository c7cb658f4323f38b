//! Store configuration, built from environment variables.
//!
//! Grounded on `RagConfig::from_env` — required fields fail fast, optional
//! fields fall back to documented defaults. `STORE_PATH` is the one
//! required field; everything else tunes the three-tier cache and batch
//! sizing.

use std::time::Duration;

use mnemolite_common::CoreError;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Filesystem path to the SQLite database file, or `:memory:`.
    pub path: String,
    pub upsert_batch_size: usize,
    pub l1_capacity: usize,
    pub l2_capacity: u64,
    pub l2_ttl: Duration,
}

impl StoreConfig {
    /// Recognized vars:
    /// - `STORE_PATH` (required)
    /// - `STORE_UPSERT_BATCH_SIZE` (default: 256)
    /// - `STORE_L1_CAPACITY` (default: 2048 chunks)
    /// - `STORE_L2_CAPACITY` (default: 20000 chunks)
    /// - `STORE_L2_TTL_SECS` (default: 300)
    pub fn from_env() -> Result<Self, CoreError> {
        use std::env;

        let path = env::var("STORE_PATH")
            .map_err(|_| CoreError::invalid_input("STORE_PATH is required"))?;

        let upsert_batch_size = env::var("STORE_UPSERT_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(256);

        let l1_capacity = env::var("STORE_L1_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(2048);

        let l2_capacity = env::var("STORE_L2_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(20_000);

        let l2_ttl_secs = env::var("STORE_L2_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(300);

        let cfg = Self {
            path,
            upsert_batch_size,
            l1_capacity,
            l2_capacity,
            l2_ttl: Duration::from_secs(l2_ttl_secs),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.path.trim().is_empty() {
            return Err(CoreError::invalid_input("STORE_PATH must not be empty"));
        }
        if self.upsert_batch_size == 0 {
            return Err(CoreError::invalid_input("STORE_UPSERT_BATCH_SIZE must be > 0"));
        }
        Ok(())
    }

    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            upsert_batch_size: 256,
            l1_capacity: 2048,
            l2_capacity: 20_000,
            l2_ttl: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_config_is_valid() {
        assert!(StoreConfig::in_memory().validate().is_ok());
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut cfg = StoreConfig::in_memory();
        cfg.path = String::new();
        assert!(cfg.validate().is_err());
    }
}
