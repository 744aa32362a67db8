//! Recommendation Aggregator
//!
//! Ranks the full catalog for one location snapshot. Every crop appears in
//! the output, zero scores included, so callers can present or truncate the
//! full list themselves. Ordering is descending by score with a stable sort,
//! so ties keep catalog registration order and output is deterministic
//! across runs.

use serde::Serialize;

use crate::catalog::{Catalog, CropMetadata};
use crate::engine::{score_crop, LocationSnapshot};

/// One crop's ranked score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub name: String,
    pub score: f64,
    pub metadata: CropMetadata,
}

/// Aggregator output wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub recommendations: Vec<ScoreResult>,
}

/// Round to one decimal for the wire; ranking uses the rounded value so the
/// displayed order can never contradict the displayed scores.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score and rank every catalog crop for one snapshot.
pub fn recommend_for_location(catalog: &Catalog, snapshot: &LocationSnapshot) -> Recommendations {
    let mut recommendations: Vec<ScoreResult> = catalog
        .crops()
        .iter()
        .map(|crop| ScoreResult {
            name: crop.name.clone(),
            score: round1(score_crop(crop, snapshot)),
            metadata: crop.metadata.clone(),
        })
        .collect();

    // Stable sort keeps catalog order on equal scores
    recommendations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Recommendations { recommendations }
}
