//! Nearest-match ranking of catalogue entries by cosine similarity.

use digsite_core::{Candidate, CatalogueEntry, FeatureVector, RankedMatches, SimilarityMatch};
use tracing::debug;

/// Runners-up returned after the best match.
pub const MAX_ALTERNATIVES: usize = 3;

/// Cosine similarity, defined as 0.0 when either vector has zero norm.
///
/// Catalogue vectors are all-zero placeholders until a real embedding model
/// is available, so the degenerate case is the common one. Sums run in `f64`:
/// squares of any finite `f32` neither overflow nor underflow there, so the
/// result is always finite and within [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
    let na = a.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();
    let nb = b.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let cos = dot / (na * nb);
    if !cos.is_finite() {
        return 0.0;
    }
    // `+ 0.0` folds -0.0 into 0.0 so equal scores sort as ties.
    (cos.clamp(-1.0, 1.0) as f32) + 0.0
}

/// Rank `candidates` against `query`: best match plus up to three alternatives.
///
/// Candidates without an id, a name, or a finite embedding of the query's
/// dimensionality are skipped. Equal scores keep input order. Returns `None`
/// when nothing qualifies.
pub fn rank(query: &FeatureVector, candidates: &[Candidate]) -> Option<RankedMatches> {
    let q = query.as_slice();
    let mut scored: Vec<SimilarityMatch> = candidates
        .iter()
        .filter_map(|c| {
            let (id, name, emb) = (c.id?, c.name.as_ref()?, c.embedding.as_ref()?);
            if emb.len() != q.len() || emb.iter().any(|x| !x.is_finite()) {
                return None;
            }
            Some(SimilarityMatch {
                entry: CatalogueEntry {
                    id,
                    name: name.clone(),
                },
                score: cosine_similarity(q, emb),
            })
        })
        .collect();

    debug!(
        candidates = candidates.len(),
        qualified = scored.len(),
        "ranked similarity candidates"
    );

    // Stable: ties keep input order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut iter = scored.into_iter();
    let best = iter.next()?;
    Some(RankedMatches {
        best,
        alternatives: iter.take(MAX_ALTERNATIVES).collect(),
    })
}
