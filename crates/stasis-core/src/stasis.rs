//! Stasis filtering: cross-validate a candidate's signals and reject the
//! ones whose signals disagree.
//!
//! `score = mean / (1 + variance)` over the signal values, population
//! variance. A strong outlier next to two weak signals has a high variance
//! and is penalized; agreeing signals keep the mean intact.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_STASIS_THRESHOLD;
use crate::signals::SignalVector;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StasisResult {
    pub chunk_id: String,
    pub mean: f64,
    pub variance: f64,
    pub score: f64,
    pub passed: bool,
}

/// Mean and population variance. Identical values yield exactly `(v, 0.0)`.
pub fn mean_variance(values: &[f64]) -> (f64, f64) {
    let Some(&first) = values.first() else {
        return (0.0, 0.0);
    };
    if values.iter().all(|v| *v == first) {
        return (first, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

pub fn stasis_score(values: &[f64]) -> f64 {
    let (mean, variance) = mean_variance(values);
    mean / (1.0 + variance)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StasisScorer {
    threshold: f64,
}

impl Default for StasisScorer {
    fn default() -> Self {
        Self::new(DEFAULT_STASIS_THRESHOLD)
    }
}

impl StasisScorer {
    /// A threshold of 0 passes everything and ranks by mean alone.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score_values(&self, chunk_id: &str, values: &[f64]) -> StasisResult {
        let (mean, variance) = mean_variance(values);
        let score = mean / (1.0 + variance);
        StasisResult {
            chunk_id: chunk_id.to_string(),
            mean,
            variance,
            score,
            passed: score >= self.threshold,
        }
    }

    pub fn score(&self, signals: &SignalVector) -> StasisResult {
        self.score_values(&signals.chunk_id, &signals.values())
    }

    /// Every result, passing or not, in input order.
    pub fn score_all(&self, signals: &[SignalVector]) -> Vec<StasisResult> {
        signals.iter().map(|s| self.score(s)).collect()
    }
}
