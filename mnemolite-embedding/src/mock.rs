//! Deterministic hash-based pseudo-embeddings for tests and for anywhere
//! the cost of loading a real model is unacceptable. Identical input always
//! produces identical output; no two distinct inputs are guaranteed
//! distinct, but collisions are astronomically unlikely at 768 dimensions.

use mnemolite_common::ids::hash_content;

use crate::domain::EMBEDDING_DIM;

/// Expands a SHA-256 digest of `salt|text` into a 768-float vector in
/// `[-1.0, 1.0]` via a splitmix64-style stream, seeded from the digest's
/// first 8 bytes.
pub fn embed(text: &str, salt: &str) -> Vec<f32> {
    let digest_hex = hash_content(format!("{salt}|{text}").as_bytes());
    let seed_bytes = &digest_hex.as_bytes()[..16];
    let mut seed = u64::from_str_radix(std::str::from_utf8(seed_bytes).unwrap(), 16).unwrap_or(0x9e3779b97f4a7c15);

    let mut out = Vec::with_capacity(EMBEDDING_DIM);
    for _ in 0..EMBEDDING_DIM {
        seed = splitmix64(seed);
        // Map the top 24 bits into [-1.0, 1.0].
        let bits = (seed >> 40) as u32;
        let unit = (bits as f32) / (1u32 << 24) as f32;
        out.push(unit * 2.0 - 1.0);
    }
    out
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_input_yields_identical_vector() {
        let a = embed("fn add(a, b) { a + b }", "code");
        let b = embed("fn add(a, b) { a + b }", "code");
        assert_eq!(a, b);
    }

    #[test]
    fn different_salt_yields_different_vector() {
        let a = embed("same text", "text");
        let b = embed("same text", "code");
        assert_ne!(a, b);
    }

    #[test]
    fn vector_has_correct_dimension_and_range() {
        let v = embed("x", "text");
        assert_eq!(v.len(), EMBEDDING_DIM);
        assert!(v.iter().all(|f| (-1.0..=1.0).contains(f)));
    }
}
