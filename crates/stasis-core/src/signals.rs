use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_IDEAL_MAX_TOKENS, DEFAULT_IDEAL_MIN_TOKENS, DEFAULT_LENGTH_FALLOFF};
use crate::corpus::Chunk;

/// Ideal chunk length in tokens. Inside the band the length signal is 1.0;
/// outside it falls linearly to 0.0 over `falloff` tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthBand {
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub falloff: usize,
}

impl Default for LengthBand {
    fn default() -> Self {
        Self {
            min_tokens: DEFAULT_IDEAL_MIN_TOKENS,
            max_tokens: DEFAULT_IDEAL_MAX_TOKENS,
            falloff: DEFAULT_LENGTH_FALLOFF,
        }
    }
}

impl LengthBand {
    pub fn score(&self, token_count: usize) -> f64 {
        let distance = if token_count < self.min_tokens {
            self.min_tokens - token_count
        } else if token_count > self.max_tokens {
            token_count - self.max_tokens
        } else {
            return 1.0;
        };

        if self.falloff == 0 {
            return 0.0;
        }
        (1.0 - distance as f64 / self.falloff as f64).max(0.0)
    }
}

/// A tokenized candidate paired with its externally supplied similarity.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub similarity: f64,
}

/// The independent relevance signals for one (query, chunk) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalVector {
    pub chunk_id: String,
    pub similarity: f64,
    pub keyword_overlap: f64,
    pub length_score: f64,
}

impl SignalVector {
    pub fn values(&self) -> [f64; 3] {
        [self.similarity, self.keyword_overlap, self.length_score]
    }
}

/// Missing or out-of-range signals count as what they are worth: NaN is 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignalCollector {
    band: LengthBand,
}

impl SignalCollector {
    pub fn new(band: LengthBand) -> Self {
        Self { band }
    }

    /// Fraction of the distinct query terms present in the chunk.
    pub fn keyword_overlap(query_terms: &[String], chunk: &Chunk) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let terms = chunk.terms();
        let hits = query_terms
            .iter()
            .filter(|q| terms.contains(q.as_str()))
            .count();
        hits as f64 / query_terms.len() as f64
    }

    pub fn collect(&self, query_terms: &[String], candidates: &[ScoredChunk]) -> Vec<SignalVector> {
        candidates
            .iter()
            .map(|c| SignalVector {
                chunk_id: c.chunk.id.clone(),
                similarity: clamp_unit(c.similarity),
                keyword_overlap: Self::keyword_overlap(query_terms, &c.chunk),
                length_score: self.band.score(c.chunk.token_count()),
            })
            .collect()
    }
}
