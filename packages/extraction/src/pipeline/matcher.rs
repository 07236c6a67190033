//! Embedding similarity matcher.
//!
//! Scores a query vector against positive and negative example vectors:
//!
//! ```text
//! best    = max cos(query, p)                        over positives
//! penalty = Σ (cos(query, n) - 0.7) × 0.5            over negatives above 0.7
//! final   = max(0, best - penalty)
//! ```
//!
//! Negatives below the 0.7 threshold cost nothing, so unrelated negatives
//! never drag down a good match; only near-duplicates of a negative do.

use std::cmp::Ordering;

use crate::error::EngineResult;
use crate::traits::provider::EmbeddingProvider;
use crate::types::embedding::{EmbeddedExample, TrainedExamples};

/// Similarity to a negative example above which a penalty applies.
pub const NEGATIVE_THRESHOLD: f32 = 0.7;

/// Weight of the excess similarity to a negative example.
pub const NEGATIVE_WEIGHT: f32 = 0.5;

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for empty or mismatched vectors and for a zero vector on
/// either side.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Score of a query against one example set.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore {
    pub best_match_score: f32,

    /// Text of the positive example with the highest similarity
    pub best_match_text: Option<String>,

    pub penalty: f32,

    pub final_score: f32,
}

/// Score a query vector against trained examples.
pub fn score(query: &[f32], examples: &TrainedExamples) -> MatchScore {
    let mut best_match_score = 0.0_f32;
    let mut best_match_text = None;

    for positive in &examples.positives {
        let similarity = cosine_similarity(query, &positive.vector);
        // strict > keeps the earliest example on ties
        if best_match_text.is_none() || similarity > best_match_score {
            best_match_score = similarity;
            best_match_text = Some(positive.text.clone());
        }
    }

    let penalty: f32 = examples
        .negatives
        .iter()
        .map(|n| cosine_similarity(query, &n.vector))
        .filter(|sim| *sim > NEGATIVE_THRESHOLD)
        .map(|sim| (sim - NEGATIVE_THRESHOLD) * NEGATIVE_WEIGHT)
        .sum();

    MatchScore {
        best_match_score,
        best_match_text,
        penalty,
        final_score: (best_match_score - penalty).max(0.0),
    }
}

/// One scored classification candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub id: String,
    pub score: MatchScore,
}

/// Ranked candidates for a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Highest-scoring candidate, if any scored above zero
    pub best: Option<CandidateScore>,

    /// Up to `top_n` candidates, highest first
    pub top: Vec<CandidateScore>,
}

/// Score every candidate, drop zero scores and rank the rest.
///
/// Ties keep candidate order.
pub fn rank<'a>(
    query: &[f32],
    candidates: impl IntoIterator<Item = (&'a str, &'a TrainedExamples)>,
    top_n: usize,
) -> Classification {
    let mut scored: Vec<CandidateScore> = candidates
        .into_iter()
        .map(|(id, examples)| CandidateScore {
            id: id.to_string(),
            score: score(query, examples),
        })
        .filter(|c| c.score.final_score > 0.0)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .final_score
            .partial_cmp(&a.score.final_score)
            .unwrap_or(Ordering::Equal)
    });

    let best = scored.first().cloned();
    scored.truncate(top_n);
    Classification { best, top: scored }
}

/// Embed example phrases into a trained set.
pub async fn train(
    embedder: &dyn EmbeddingProvider,
    positives: &[String],
    negatives: &[String],
) -> EngineResult<TrainedExamples> {
    let positive_vectors = embedder.embed_batch(positives).await?;
    let negative_vectors = embedder.embed_batch(negatives).await?;

    let pair = |texts: &[String], vectors: Vec<Vec<f32>>| {
        texts
            .iter()
            .zip(vectors)
            .map(|(text, vector)| EmbeddedExample::new(text.clone(), vector))
            .collect::<Vec<_>>()
    };

    Ok(TrainedExamples::new(
        pair(positives, positive_vectors),
        pair(negatives, negative_vectors),
    ))
}
