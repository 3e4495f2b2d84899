//! Multi-factor memory scoring
//!
//! ```text
//! relevance  = 1 - distance
//! recency    = exp(-decay_rate * seconds_since_last_access)
//! importance = stored weight
//! score      = w_rel * relevance + w_rec * recency + w_imp * importance
//! ```
//!
//! Ranking sorts by score descending, then by more recent access, then by
//! id so equal inputs always produce the same order.

use super::record::MemoryRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Weights applied to each score component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub relevance: f64,
    pub recency: f64,
    pub importance: f64,
}

impl ScoringWeights {
    /// All weights finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.relevance, self.recency, self.importance]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            relevance: 1.0,
            recency: 1.0,
            importance: 1.0,
        }
    }
}

/// Individual components of a memory's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub relevance: f64,
    pub recency: f64,
    pub importance: f64,
    pub total: f64,
}

/// A ranked memory together with how it scored.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub distance: f64,
    pub score: ScoreBreakdown,
}

/// `1 - distance`.
pub fn relevance(distance: f64) -> f64 {
    1.0 - distance
}

/// Exponential decay since the last access; 1.0 for "just now".
pub fn recency(decay_rate: f64, now: DateTime<Utc>, last_accessed: DateTime<Utc>) -> f64 {
    let elapsed_ms = (now - last_accessed).num_milliseconds().max(0);
    let elapsed_secs = elapsed_ms as f64 / 1000.0;
    (-decay_rate * elapsed_secs).exp()
}

/// Applies weights and decay to index candidates.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    weights: ScoringWeights,
    decay_rate: f64,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, decay_rate: f64) -> Self {
        Self {
            weights,
            decay_rate,
        }
    }

    pub fn score(&self, distance: f64, record: &MemoryRecord, now: DateTime<Utc>) -> ScoreBreakdown {
        let relevance = relevance(distance);
        let recency = recency(self.decay_rate, now, record.last_accessed);
        let importance = record.importance;
        let total = self.weights.relevance * relevance
            + self.weights.recency * recency
            + self.weights.importance * importance;

        ScoreBreakdown {
            relevance,
            recency,
            importance,
            total,
        }
    }

    /// Score every candidate and return them best first.
    pub fn rank(
        &self,
        candidates: impl IntoIterator<Item = (f64, MemoryRecord)>,
        now: DateTime<Utc>,
    ) -> Vec<ScoredMemory> {
        let mut scored: Vec<ScoredMemory> = candidates
            .into_iter()
            .map(|(distance, record)| ScoredMemory {
                score: self.score(distance, &record, now),
                distance,
                record,
            })
            .collect();
        scored.sort_by(rank_order);
        scored
    }
}

/// Score descending, then last access descending, then id ascending.
pub fn rank_order(a: &ScoredMemory, b: &ScoredMemory) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then_with(|| b.record.last_accessed.cmp(&a.record.last_accessed))
        .then_with(|| a.record.id.cmp(&b.record.id))
}
