//! Approximate nearest-neighbor vector search via an in-process HNSW index,
//! one per repository-domain pair (TEXT, CODE). Rebuilt from the persisted
//! rows on store open and kept incrementally up to date by `upsert`/`remove`.

use std::collections::HashMap;
use std::sync::RwLock;

use hnsw_rs::prelude::*;
use uuid::Uuid;

use crate::record::VectorDomain;

const MAX_NB_CONNECTION: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const EF_SEARCH: usize = 64;
const MAX_LAYER: usize = 16;

/// One HNSW graph plus the `usize <-> Uuid` id mapping HNSW itself doesn't
/// carry.
/// HNSW has no point delete; "removal" means forgetting an internal id's
/// mapping back to a chunk so `search` can no longer resolve it. The stale
/// vector stays in the underlying graph as unreachable garbage until the
/// next full rebuild (store reopen, or a future compaction pass), but it
/// can never again surface in a result.
struct DomainIndex {
    hnsw: Hnsw<'static, f32, DistCosine>,
    id_to_chunk: RwLock<HashMap<usize, Uuid>>,
    chunk_to_id: RwLock<HashMap<Uuid, usize>>,
    next_id: RwLock<usize>,
}

impl DomainIndex {
    fn new(expected_capacity: usize) -> Self {
        Self {
            hnsw: Hnsw::new(MAX_NB_CONNECTION, expected_capacity.max(16), MAX_LAYER, EF_CONSTRUCTION, DistCosine {}),
            id_to_chunk: RwLock::new(HashMap::new()),
            chunk_to_id: RwLock::new(HashMap::new()),
            next_id: RwLock::new(0),
        }
    }

    /// Re-upserting a chunk already in this index retires its previous
    /// entry first, so a search can never resolve both the stale and the
    /// fresh vector back to the same `chunk_id`.
    fn insert(&self, chunk_id: Uuid, vector: &[f32]) {
        self.forget(chunk_id);

        let mut next_id = self.next_id.write().unwrap();
        let id = *next_id;
        *next_id += 1;
        drop(next_id);
        self.hnsw.insert((vector, id));
        self.id_to_chunk.write().unwrap().insert(id, chunk_id);
        self.chunk_to_id.write().unwrap().insert(chunk_id, id);
    }

    fn remove(&self, chunk_id: Uuid) {
        self.forget(chunk_id);
    }

    fn forget(&self, chunk_id: Uuid) {
        if let Some(id) = self.chunk_to_id.write().unwrap().remove(&chunk_id) {
            self.id_to_chunk.write().unwrap().remove(&id);
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(Uuid, f32)> {
        let neighbours = self.hnsw.search(query, k, EF_SEARCH);
        let id_to_chunk = self.id_to_chunk.read().unwrap();
        let mut out = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for n in neighbours {
            let Some(&chunk_id) = id_to_chunk.get(&n.d_id) else { continue };
            if seen.insert(chunk_id) {
                out.push((chunk_id, n.distance));
            }
        }
        out
    }
}

/// One `DomainIndex` per `(repository, domain)` pair, guarded by a single
/// map-level lock since rebuilds (on store open) and incremental inserts
/// (on upsert) are both rare relative to searches.
pub struct VectorIndex {
    domains: RwLock<HashMap<(String, VectorDomainKey), DomainIndex>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum VectorDomainKey {
    Text,
    Code,
}

impl From<VectorDomain> for VectorDomainKey {
    fn from(d: VectorDomain) -> Self {
        match d {
            VectorDomain::Text => VectorDomainKey::Text,
            VectorDomain::Code => VectorDomainKey::Code,
        }
    }
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            domains: RwLock::new(HashMap::new()),
        }
    }

    pub fn upsert(&self, repository: &str, domain: VectorDomain, chunk_id: Uuid, vector: &[f32]) {
        let key = (repository.to_string(), domain.into());
        let mut domains = self.domains.write().unwrap();
        let index = domains.entry(key).or_insert_with(|| DomainIndex::new(1024));
        index.insert(chunk_id, vector);
    }

    /// Retires `chunk_id` from `(repository, domain)`'s index, if present.
    /// A no-op (not an error) when the repository or domain has no index
    /// yet, or `chunk_id` was never indexed — callers delete by id
    /// unconditionally rather than checking first.
    pub fn remove(&self, repository: &str, domain: VectorDomain, chunk_id: Uuid) {
        let key = (repository.to_string(), domain.into());
        let domains = self.domains.read().unwrap();
        if let Some(index) = domains.get(&key) {
            index.remove(chunk_id);
        }
    }

    /// Approximate top-`k` nearest neighbours for `query` within one
    /// repository's domain index. Returns an empty vector (not an error)
    /// when the repository has no index yet — an empty repository is a
    /// valid, zero-result search, not a fault.
    pub fn search(&self, repository: &str, domain: VectorDomain, query: &[f32], k: usize) -> Vec<(Uuid, f32)> {
        let key = (repository.to_string(), domain.into());
        let domains = self.domains.read().unwrap();
        match domains.get(&key) {
            Some(index) => index.search(query, k),
            None => Vec::new(),
        }
    }

    /// Drops the whole per-repository index for both domains. HNSW has no
    /// cheap single-point delete; `bulk_delete` rebuilds from the remaining
    /// rows instead of tombstoning, same as the store's own row deletion.
    pub fn drop_repository(&self, repository: &str) {
        let mut domains = self.domains.write().unwrap();
        domains.retain(|(repo, _), _| repo != repository);
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}
