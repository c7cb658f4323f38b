//! Reciprocal Rank Fusion: `score(x) = Σᵢ 1/(rrf_k + rᵢ(x))` over each
//! source ranked list `i`, 1-based rank. Ties break by lower lexical rank,
//! then lower vector rank, then chunk id — both chosen so the ordering is
//! total and reproducible across runs with identical inputs.

use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

/// One named, 1-based-rank source list contributing to the fused score.
pub struct RankedSource {
    pub name: &'static str,
    pub ranked_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct FusedHit {
    pub chunk_id: Uuid,
    pub score: f64,
    pub lexical_rank: Option<u32>,
    pub vector_rank: Option<u32>,
}

/// Fuses any number of named source lists. A source's name starting with
/// `"vector"` counts toward the tie-break's `vector_rank` (the best, i.e.
/// lowest, rank across all vector-domain lists); a source literally named
/// `"lexical"` is the tie-break's `lexical_rank`.
pub fn rrf_fuse(sources: &[RankedSource], rrf_k: u32) -> Vec<FusedHit> {
    let mut scores: HashMap<Uuid, f64> = HashMap::new();
    let mut lexical_rank: HashMap<Uuid, u32> = HashMap::new();
    let mut vector_rank: HashMap<Uuid, u32> = HashMap::new();

    for source in sources {
        for (idx, id) in source.ranked_ids.iter().enumerate() {
            let rank = (idx + 1) as u32;
            let contribution = 1.0 / (rrf_k as f64 + rank as f64);
            *scores.entry(*id).or_insert(0.0) += contribution;

            if source.name == "lexical" {
                lexical_rank.entry(*id).and_modify(|r| *r = (*r).min(rank)).or_insert(rank);
            } else if source.name.starts_with("vector") {
                vector_rank.entry(*id).and_modify(|r| *r = (*r).min(rank)).or_insert(rank);
            }
        }
    }

    let mut hits: Vec<FusedHit> = scores
        .into_iter()
        .map(|(chunk_id, score)| FusedHit {
            chunk_id,
            score,
            lexical_rank: lexical_rank.get(&chunk_id).copied(),
            vector_rank: vector_rank.get(&chunk_id).copied(),
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| rank_or_max(a.lexical_rank).cmp(&rank_or_max(b.lexical_rank)))
            .then_with(|| rank_or_max(a.vector_rank).cmp(&rank_or_max(b.vector_rank)))
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
    hits
}

fn rank_or_max(rank: Option<u32>) -> u32 {
    rank.unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonicity_holds_across_both_source_lists() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();
        let lexical = RankedSource { name: "lexical", ranked_ids: vec![x, y] };
        let vector = RankedSource { name: "vector_text", ranked_ids: vec![x, y] };
        let fused = rrf_fuse(&[lexical, vector], 60);
        assert_eq!(fused[0].chunk_id, x);
        assert_eq!(fused[1].chunk_id, y);
    }

    #[test]
    fn score_matches_spec_example() {
        let x = Uuid::new_v4();
        let lexical = RankedSource { name: "lexical", ranked_ids: vec![x] };
        let vector = RankedSource { name: "vector_text", ranked_ids: vec![x] };
        let fused = rrf_fuse(&[lexical, vector], 60);
        let expected = 2.0 / 61.0;
        assert!((fused[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn ties_break_by_chunk_id_when_ranks_match() {
        let mut ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let source = RankedSource { name: "other", ranked_ids: vec![ids[0]] };
        let source2 = RankedSource { name: "other2", ranked_ids: vec![ids[1]] };
        let fused = rrf_fuse(&[source, source2], 60);
        // Equal contribution (rank 1 from one list each); tie-break falls
        // through to chunk id since neither list is lexical or vector.
        assert_eq!(fused[0].chunk_id, ids[0]);
    }
}
