//! Three-tier cache in front of the persisted store: L1 (small, per-process,
//! no TTL, evicted by recency), L2 (larger, TTL'd, shared across the
//! process's async tasks), L3 (the SQLite-backed store itself).
//!
//! A `CircuitBreaker` guards every L2 call the same way it guards the
//! embedding service: this deployment's L2 is in-process (`moka`), so a
//! call to it essentially never fails, but routing through the breaker
//! means a future networked L2 (e.g. a shared cache server) is a drop-in
//! replacement with no caller-visible change, and a tripped breaker makes
//! `get` degrade straight to an L3 lookup rather than waiting out a call
//! that is unlikely to ever return.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use moka::sync::Cache as MokaCache;
use uuid::Uuid;

use mnemolite_common::{CircuitBreaker, CoreError};

use crate::record::ChunkRow;

pub struct ThreeTierCache {
    l1: Mutex<LruCache<Uuid, ChunkRow>>,
    l2: MokaCache<Uuid, ChunkRow>,
    breaker: CircuitBreaker,
}

impl ThreeTierCache {
    pub fn new(l1_capacity: usize, l2_capacity: u64, l2_ttl: Duration) -> Self {
        Self {
            l1: Mutex::new(LruCache::new(NonZeroUsize::new(l1_capacity.max(1)).unwrap())),
            l2: MokaCache::builder().max_capacity(l2_capacity).time_to_live(l2_ttl).build(),
            breaker: CircuitBreaker::for_cache(),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// A miss, an L2-level cache miss, and a circuit-open degrade are all
    /// the same thing to this method's caller: `None`, meaning fall
    /// through to L3. Only the breaker's bookkeeping tells them apart.
    pub fn get(&self, id: Uuid) -> Option<ChunkRow> {
        if let Some(row) = self.l1.lock().unwrap().get(&id) {
            return Some(row.clone());
        }
        let row = self.breaker.call_sync(|| Ok::<_, CoreError>(self.l2.get(&id))).ok().flatten()?;
        self.l1.lock().unwrap().put(id, row.clone());
        Some(row)
    }

    pub fn put(&self, row: ChunkRow) {
        let id = row.id;
        self.l1.lock().unwrap().put(id, row.clone());
        let _ = self.breaker.call_sync(|| Ok::<_, CoreError>(self.l2.insert(id, row)));
    }

    pub fn invalidate(&self, id: Uuid) {
        self.l1.lock().unwrap().pop(&id);
        let _ = self.breaker.call_sync(|| Ok::<_, CoreError>(self.l2.invalidate(&id)));
    }

    /// Cascades a `bulk_delete` into both tiers, per the Chunk Store
    /// contract: `bulk_delete` is atomic and invalidates the in-memory
    /// cache for that repository.
    pub fn invalidate_repository(&self, repository: &str) {
        // L1 has no predicate-based eviction; a full clear on a bulk_delete
        // (already a rare, repository-wide operation) is cheaper than
        // threading repository membership through the LRU's eviction path.
        self.l1.lock().unwrap().clear();
        let repository = repository.to_string();
        let _ = self.breaker.call_sync(|| {
            self.l2
                .invalidate_entries_if(move |_, row| row.repository == repository)
                .map_err(|e| CoreError::unavailable("shared_cache", e.to_string()))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_common::{CircuitState, LanguageTag};
    use mnemolite_parser::{ChunkKind, ChunkMetadata};

    fn row(id: Uuid) -> ChunkRow {
        ChunkRow {
            id,
            repository: "repo".to_string(),
            file_path: "a.py".to_string(),
            name: "f".to_string(),
            name_path: "f".to_string(),
            kind: ChunkKind::Function,
            language: LanguageTag::Python,
            span: mnemolite_common::Span::new(1, 1, 0, 1),
            text: String::new(),
            metadata: ChunkMetadata::default(),
            commit_hash: None,
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn l1_hit_skips_the_breaker_entirely() {
        let cache = ThreeTierCache::new(16, 64, Duration::from_secs(60));
        let id = Uuid::new_v4();
        cache.put(row(id));
        assert!(cache.get(id).is_some());
        assert_eq!(cache.breaker().snapshot().state, CircuitState::Closed);
    }

    /// A tripped breaker degrades `get` to a clean miss instead of
    /// propagating `CircuitOpen` — the store's `get` then falls through to
    /// L3, which is exactly the point of fronting it with a breaker.
    #[test]
    fn open_breaker_degrades_get_to_a_miss_without_erroring() {
        let cache = ThreeTierCache::new(16, 64, Duration::from_secs(60));
        let id = Uuid::new_v4();
        cache.l2.insert(id, row(id));

        for _ in 0..5 {
            let _ = cache.breaker.call_sync(|| Err::<(), _>(CoreError::unavailable("shared_cache", "forced")));
        }
        assert_eq!(cache.breaker().snapshot().state, CircuitState::Open);

        assert!(cache.get(id).is_none());
    }
}
