use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOP_K;
use crate::signals::clamp_unit;
use crate::stasis::StasisResult;
use crate::thread::{Thread, best_thread};

/// Which ranking path vouched for a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Stasis,
    Gradient,
    Both,
    /// Cross-referencing disabled: raw supplier similarity only.
    Similarity,
}

/// Relative weight of the Stasis score and the best thread strength for
/// chunks found by both paths. The combination is a weighted mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankWeights {
    pub stasis: f64,
    pub gradient: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            stasis: 1.0,
            gradient: 1.0,
        }
    }
}

impl RankWeights {
    pub fn combine(&self, stasis_score: f64, gradient_strength: f64) -> f64 {
        let total = self.stasis + self.gradient;
        if total <= 0.0 {
            return 0.0;
        }
        (self.stasis * stasis_score + self.gradient * gradient_strength) / total
    }
}

/// Everything that went into a result's score.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportingDetail {
    pub similarity: Option<f64>,
    /// Present whenever the chunk was scored, even if it failed the threshold.
    pub stasis: Option<StasisResult>,
    pub best_thread: Option<Thread>,
    pub thread_count: usize,
    pub matched_terms: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub chunk_id: String,
    pub source: Source,
    pub combined_score: f64,
    pub supporting_detail: SupportingDetail,
}

impl RankedResult {
    fn variance(&self) -> f64 {
        self.supporting_detail
            .stasis
            .as_ref()
            .map_or(f64::INFINITY, |s| s.variance)
    }
}

/// Descending score, then lower Stasis variance (unscored last), then id.
fn compare(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.combined_score
        .total_cmp(&a.combined_score)
        .then_with(|| a.variance().total_cmp(&b.variance()))
        .then_with(|| a.chunk_id.cmp(&b.chunk_id))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResultRanker {
    weights: RankWeights,
    top_k: usize,
}

impl Default for ResultRanker {
    fn default() -> Self {
        Self::new(RankWeights::default(), DEFAULT_TOP_K)
    }
}

impl ResultRanker {
    pub fn new(weights: RankWeights, top_k: usize) -> Self {
        Self { weights, top_k }
    }

    /// Merge passing Stasis results with gradient threads by chunk id.
    pub fn merge(
        &self,
        stasis: &[StasisResult],
        threads: &[Thread],
        similarities: &HashMap<String, f64>,
    ) -> Vec<RankedResult> {
        let scored: HashMap<&str, &StasisResult> =
            stasis.iter().map(|s| (s.chunk_id.as_str(), s)).collect();

        let mut by_chunk: HashMap<&str, Vec<&Thread>> = HashMap::new();
        for thread in threads {
            by_chunk.entry(thread.chunk_id.as_str()).or_default().push(thread);
        }

        let ids: BTreeSet<&str> = stasis
            .iter()
            .filter(|s| s.passed)
            .map(|s| s.chunk_id.as_str())
            .chain(by_chunk.keys().copied())
            .collect();

        let mut results: Vec<RankedResult> = ids
            .into_iter()
            .filter_map(|id| {
                let stasis = scored.get(id).copied();
                let chunk_threads = by_chunk.get(id).map(Vec::as_slice).unwrap_or(&[]);
                let best = best_thread(chunk_threads.iter().copied());
                // An anchor that reached no neighbour lends no gradient support.
                let gradient = best.filter(|t| !t.nodes.is_empty());

                let (source, combined_score) = match (stasis.filter(|s| s.passed), gradient) {
                    (Some(s), Some(t)) => (
                        Source::Both,
                        self.weights.combine(s.score, t.max_strength()),
                    ),
                    (Some(s), None) => (Source::Stasis, s.score),
                    (None, Some(t)) => (Source::Gradient, t.max_strength()),
                    (None, None) => return None,
                };

                Some(RankedResult {
                    chunk_id: id.to_string(),
                    source,
                    combined_score,
                    supporting_detail: SupportingDetail {
                        similarity: similarities.get(id).copied(),
                        stasis: stasis.cloned(),
                        best_thread: best.cloned(),
                        thread_count: chunk_threads.len(),
                        matched_terms: best.map(Thread::matched_terms).unwrap_or_default(),
                    },
                })
            })
            .collect();

        results.sort_by(compare);
        results.truncate(self.top_k);
        results
    }

    /// Rank purely by supplier similarity, bypassing Stasis and gradient.
    /// Similarities are clamped to `[0, 1]` and NaN counts as 0.
    pub fn by_similarity(
        &self,
        candidates: impl IntoIterator<Item = (String, f64)>,
    ) -> Vec<RankedResult> {
        let mut results: Vec<RankedResult> = candidates
            .into_iter()
            .map(|(chunk_id, raw)| {
                let similarity = clamp_unit(raw);
                RankedResult {
                    chunk_id,
                    source: Source::Similarity,
                    combined_score: similarity,
                    supporting_detail: SupportingDetail {
                        similarity: Some(similarity),
                        ..SupportingDetail::default()
                    },
                }
            })
            .collect();

        results.sort_by(compare);
        results.truncate(self.top_k);
        results
    }
}
