//! Stable identifier and content-hashing utilities.
//!
//! UUID v5 (name-based, fixed namespace) gives deterministic chunk/node ids
//! so re-indexing the same inputs never mints new identities. Content
//! hashing uses SHA-256 rather than the FNV-1a scheme of earlier internal
//! tooling, since cache keys here are shared across process boundaries
//! (L2) where collision resistance matters more than raw speed.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Namespace for all MnemoLite-minted identifiers. Arbitrary but fixed, so
/// the same logical key always produces the same UUID across processes.
const NAMESPACE: Uuid = Uuid::from_bytes([
    0x6d, 0x6e, 0x65, 0x6d, 0x6f, 0x6c, 0x69, 0x74, 0x65, 0x2d, 0x63, 0x6f, 0x72, 0x65, 0x21, 0x21,
]);

/// Deterministic UUID v5 from a logical key.
#[inline]
pub fn uuid_v5_from_key(key: &str) -> Uuid {
    Uuid::new_v5(&NAMESPACE, key.as_bytes())
}

/// Stable chunk id: repository + file path + byte range + name_path.
pub fn chunk_id(repository: &str, file_path: &str, start_byte: usize, end_byte: usize, name_path: &str) -> Uuid {
    let key = format!(
        "chunk|{repository}|{file_path}|{start_byte}-{end_byte}|{name_path}"
    );
    uuid_v5_from_key(&key)
}

/// Stable node id: one-to-one with its backing chunk.
pub fn node_id(chunk_id: Uuid) -> Uuid {
    uuid_v5_from_key(&format!("node|{chunk_id}"))
}

/// Stable edge id: source, target, relation — used for dedup, not exposed.
pub fn edge_key(source: Uuid, target: Uuid, relation: &str) -> String {
    format!("{source}|{target}|{relation}")
}

/// SHA-256 content hash as a lowercase hex string, used as the L1 cache key
/// and to detect unchanged file content across reindex calls.
pub fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        let a = chunk_id("repo", "a.py", 0, 10, "module.add");
        let b = chunk_id("repo", "a.py", 0, 10, "module.add");
        assert_eq!(a, b);
    }

    #[test]
    fn chunk_id_differs_on_range() {
        let a = chunk_id("repo", "a.py", 0, 10, "module.add");
        let b = chunk_id("repo", "a.py", 0, 11, "module.add");
        assert_ne!(a, b);
    }

    #[test]
    fn hash_content_is_deterministic() {
        assert_eq!(hash_content(b"hello"), hash_content(b"hello"));
        assert_ne!(hash_content(b"hello"), hash_content(b"world"));
    }
}
