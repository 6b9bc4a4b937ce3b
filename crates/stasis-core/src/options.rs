use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BOOST_AMOUNT, DEFAULT_CANDIDATE_POOL, DEFAULT_DECAY_RATE, DEFAULT_STASIS_THRESHOLD,
    DEFAULT_STRENGTH_FLOOR, DEFAULT_TOP_K,
};
use crate::error::{RankError, Result};
use crate::propagate::PropagationParams;
use crate::rank::{RankWeights, ResultRanker};
use crate::signals::{LengthBand, SignalCollector};
use crate::stasis::StasisScorer;
use crate::tokenizer::{
    BoundaryPredicate, TokenizerConfig, boundary_markers, default_stop_terms, no_boundaries,
};

/// Where anchor rarity is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermStatsScope {
    /// Every chunk the supplier holds.
    #[default]
    Corpus,
    /// Only the candidates returned for this query.
    Candidates,
}

/// Per-call ranking options. Nothing here is process-wide.
#[derive(Clone)]
pub struct RankOptions {
    pub stasis_threshold: f64,
    pub top_k: usize,
    pub candidate_pool: usize,
    /// When false, Stasis and gradient are skipped and results are ordered
    /// by supplier similarity alone.
    pub use_cross_reference: bool,
    pub decay_rate: f64,
    pub boost_amount: f64,
    pub strength_floor: f64,
    pub stop_terms: HashSet<String>,
    pub boundary_predicate: BoundaryPredicate,
    pub weights: RankWeights,
    pub length_band: LengthBand,
    /// Only query terms found in at most this fraction of chunks boost a chain.
    pub boost_commonality_ratio: f64,
    pub term_stats_scope: TermStatsScope,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            stasis_threshold: DEFAULT_STASIS_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            use_cross_reference: true,
            decay_rate: DEFAULT_DECAY_RATE,
            boost_amount: DEFAULT_BOOST_AMOUNT,
            strength_floor: DEFAULT_STRENGTH_FLOOR,
            stop_terms: default_stop_terms(),
            boundary_predicate: no_boundaries(),
            weights: RankWeights::default(),
            length_band: LengthBand::default(),
            boost_commonality_ratio: 1.0,
            term_stats_scope: TermStatsScope::default(),
        }
    }
}

impl fmt::Debug for RankOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankOptions")
            .field("stasis_threshold", &self.stasis_threshold)
            .field("top_k", &self.top_k)
            .field("candidate_pool", &self.candidate_pool)
            .field("use_cross_reference", &self.use_cross_reference)
            .field("decay_rate", &self.decay_rate)
            .field("boost_amount", &self.boost_amount)
            .field("strength_floor", &self.strength_floor)
            .field("stop_terms", &self.stop_terms.len())
            .field("weights", &self.weights)
            .field("length_band", &self.length_band)
            .field("boost_commonality_ratio", &self.boost_commonality_ratio)
            .field("term_stats_scope", &self.term_stats_scope)
            .finish_non_exhaustive()
    }
}

fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(RankError::InvalidOptions(msg()))
    }
}

impl RankOptions {
    pub fn validate(&self) -> Result<()> {
        check(
            self.stasis_threshold.is_finite() && self.stasis_threshold >= 0.0,
            || format!("stasis_threshold must be >= 0, got {}", self.stasis_threshold),
        )?;
        check(self.top_k > 0, || "top_k must be at least 1".to_string())?;
        check(self.candidate_pool > 0, || {
            "candidate_pool must be at least 1".to_string()
        })?;
        check(self.decay_rate > 0.0 && self.decay_rate < 1.0, || {
            format!("decay_rate must be in (0, 1), got {}", self.decay_rate)
        })?;
        check((0.0..=1.0).contains(&self.boost_amount), || {
            format!("boost_amount must be in [0, 1], got {}", self.boost_amount)
        })?;
        check(self.strength_floor > 0.0 && self.strength_floor < 1.0, || {
            format!("strength_floor must be in (0, 1), got {}", self.strength_floor)
        })?;
        check(
            self.weights.stasis.is_finite()
                && self.weights.gradient.is_finite()
                && self.weights.stasis >= 0.0
                && self.weights.gradient >= 0.0
                && self.weights.stasis + self.weights.gradient > 0.0,
            || format!("weights must be non-negative and not both zero, got {:?}", self.weights),
        )?;
        check(self.length_band.min_tokens <= self.length_band.max_tokens, || {
            format!(
                "length band min {} exceeds max {}",
                self.length_band.min_tokens, self.length_band.max_tokens
            )
        })?;
        check((0.0..=1.0).contains(&self.boost_commonality_ratio), || {
            format!(
                "boost_commonality_ratio must be in [0, 1], got {}",
                self.boost_commonality_ratio
            )
        })
    }

    /// Add stop terms on top of the current set.
    pub fn with_stop_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_terms
            .extend(terms.into_iter().map(|t| t.as_ref().to_lowercase()));
        self
    }

    pub fn with_boundary_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.boundary_predicate = boundary_markers(markers);
        self
    }

    pub fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig::new(self.stop_terms.clone(), self.boundary_predicate.clone())
    }

    pub fn propagation_params(&self) -> PropagationParams {
        PropagationParams {
            decay_rate: self.decay_rate,
            boost_amount: self.boost_amount,
            strength_floor: self.strength_floor,
        }
    }

    pub fn signal_collector(&self) -> SignalCollector {
        SignalCollector::new(self.length_band)
    }

    pub fn stasis_scorer(&self) -> StasisScorer {
        StasisScorer::new(self.stasis_threshold)
    }

    pub fn ranker(&self) -> ResultRanker {
        ResultRanker::new(self.weights, self.top_k)
    }
}

/// Serializable mirror of [`RankOptions`] for configuration files.
/// Every field is optional and falls back to the default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankSettings {
    pub stasis_threshold: f64,
    pub top_k: usize,
    pub candidate_pool: usize,
    pub use_cross_reference: bool,
    pub decay_rate: f64,
    pub boost_amount: f64,
    pub strength_floor: f64,
    /// Drop the built-in stop-term list and use only `extra_stop_terms`.
    pub replace_default_stop_terms: bool,
    pub extra_stop_terms: Vec<String>,
    pub boundary_markers: Vec<String>,
    pub weights: RankWeights,
    pub length_band: LengthBand,
    pub boost_commonality_ratio: f64,
    pub term_stats_scope: TermStatsScope,
}

impl Default for RankSettings {
    fn default() -> Self {
        let options = RankOptions::default();
        Self {
            stasis_threshold: options.stasis_threshold,
            top_k: options.top_k,
            candidate_pool: options.candidate_pool,
            use_cross_reference: options.use_cross_reference,
            decay_rate: options.decay_rate,
            boost_amount: options.boost_amount,
            strength_floor: options.strength_floor,
            replace_default_stop_terms: false,
            extra_stop_terms: Vec::new(),
            boundary_markers: Vec::new(),
            weights: options.weights,
            length_band: options.length_band,
            boost_commonality_ratio: options.boost_commonality_ratio,
            term_stats_scope: options.term_stats_scope,
        }
    }
}

impl RankSettings {
    pub fn into_options(self) -> RankOptions {
        let stop_terms = if self.replace_default_stop_terms {
            HashSet::new()
        } else {
            default_stop_terms()
        };
        let boundary_predicate = if self.boundary_markers.is_empty() {
            no_boundaries()
        } else {
            boundary_markers(&self.boundary_markers)
        };

        RankOptions {
            stasis_threshold: self.stasis_threshold,
            top_k: self.top_k,
            candidate_pool: self.candidate_pool,
            use_cross_reference: self.use_cross_reference,
            decay_rate: self.decay_rate,
            boost_amount: self.boost_amount,
            strength_floor: self.strength_floor,
            stop_terms,
            boundary_predicate,
            weights: self.weights,
            length_band: self.length_band,
            boost_commonality_ratio: self.boost_commonality_ratio,
            term_stats_scope: self.term_stats_scope,
        }
        .with_stop_terms(&self.extra_stop_terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let options = RankOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.stasis_threshold, 0.05);
        assert_eq!(options.decay_rate, 0.85);
        assert_eq!(options.boost_amount, 0.3);
        assert_eq!(options.strength_floor, 0.01);
        assert!(options.use_cross_reference);
    }

    #[test]
    fn test_zero_threshold_is_valid() {
        let options = RankOptions {
            stasis_threshold: 0.0,
            ..RankOptions::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let cases = [
            RankOptions {
                decay_rate: 1.0,
                ..RankOptions::default()
            },
            RankOptions {
                boost_amount: 1.5,
                ..RankOptions::default()
            },
            RankOptions {
                strength_floor: 0.0,
                ..RankOptions::default()
            },
            RankOptions {
                top_k: 0,
                ..RankOptions::default()
            },
            RankOptions {
                stasis_threshold: f64::NAN,
                ..RankOptions::default()
            },
            RankOptions {
                weights: RankWeights {
                    stasis: 0.0,
                    gradient: 0.0,
                },
                ..RankOptions::default()
            },
        ];
        for options in cases {
            assert!(
                matches!(options.validate(), Err(RankError::InvalidOptions(_))),
                "{options:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_with_stop_terms_extends() {
        let options = RankOptions::default().with_stop_terms(["Lol"]);
        let config = options.tokenizer_config();
        assert!(config.is_stop_term("lol"));
        assert!(config.is_stop_term("the"));
    }

    #[test]
    fn test_settings_into_options() {
        let settings = RankSettings {
            replace_default_stop_terms: true,
            extra_stop_terms: vec!["meanwhile".to_string()],
            boundary_markers: vec!["Alice".to_string()],
            top_k: 3,
            ..RankSettings::default()
        };
        let options = settings.into_options();
        let config = options.tokenizer_config();
        assert!(config.is_stop_term("meanwhile"));
        assert!(!config.is_stop_term("the"));
        assert!(config.is_boundary("alice"));
        assert_eq!(options.top_k, 3);
    }

    #[test]
    fn test_settings_partial_json() {
        let settings: RankSettings =
            serde_json::from_str(r#"{"top_k": 9, "weights": {"stasis": 2.0}}"#).unwrap();
        assert_eq!(settings.top_k, 9);
        assert_eq!(settings.weights.stasis, 2.0);
        assert_eq!(settings.weights.gradient, 1.0);
        assert_eq!(settings.decay_rate, 0.85);
    }
}
