//! Integration tests exercising the full ranking pipeline:
//! supplier → tokenize → {signals → Stasis} + {anchor → propagate → threads} → merge.

use std::convert::Infallible;

use approx::assert_relative_eq;
use proptest::prelude::*;
use stasis_core::{
    Candidate, CandidateSupplier, ChainQuery, Chunk, ConfidenceTier, Direction,
    PropagationParams, RankEngine, RankOptions, Source, SourceChunk, StasisScorer,
    TokenizerConfig, assemble_threads, boundary_markers, rank_candidates, stasis_score,
};

/// In-memory supplier with fixed similarities, best first.
struct FixedSupplier {
    chunks: Vec<(String, String, f64)>,
}

impl FixedSupplier {
    fn new(chunks: &[(&str, &str, f64)]) -> Self {
        Self {
            chunks: chunks
                .iter()
                .map(|(id, text, sim)| (id.to_string(), text.to_string(), *sim))
                .collect(),
        }
    }
}

impl CandidateSupplier for FixedSupplier {
    type Error = Infallible;

    fn search(&self, _query: &str, top_n: usize) -> Result<Vec<Candidate>, Infallible> {
        let mut hits: Vec<Candidate> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(ordinal, (id, text, sim))| Candidate {
                chunk_id: id.clone(),
                text: text.clone(),
                similarity: *sim,
                ordinal,
                source_timestamp: None,
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(top_n);
        Ok(hits)
    }

    fn all_chunks(&self) -> Result<Vec<SourceChunk>, Infallible> {
        Ok(self
            .chunks
            .iter()
            .enumerate()
            .map(|(ordinal, (id, text, _))| SourceChunk {
                chunk_id: id.clone(),
                text: text.clone(),
                ordinal,
                source_timestamp: None,
            })
            .collect())
    }
}

const CHAT_LOG: &[(&str, &str, f64)] = &[
    (
        "m1",
        "alice: the deploy pipeline failed again on the staging cluster this morning",
        0.82,
    ),
    (
        "m2",
        "bob: staging cluster ran out of disk, pipeline logs filled the volume",
        0.78,
    ),
    (
        "m3",
        "alice: lunch plans? bob: tacos sound great, see you at noon",
        0.31,
    ),
    (
        "m4",
        "carol: rotated the staging credentials, pipeline should pick them up",
        0.64,
    ),
];

/// Test 1: Two-chunk corpus, anchor chains into a boosted neighbour.
#[test]
fn cat_sat_thread_is_high_confidence() {
    let supplier = FixedSupplier::new(&[
        ("c1", "The cat sat.", 0.9),
        ("c2", "A dog ran far away fast.", 0.4),
    ]);
    let engine = RankEngine::new(&supplier);
    let options = RankOptions::default();

    let anchor = engine.anchor("cat sat", &options).unwrap();
    assert_eq!(anchor.term, "cat");

    let results = engine.rank("cat sat", &options).unwrap();
    let top = &results[0];
    assert_eq!(top.chunk_id, "c1");
    assert_eq!(top.source, Source::Both);

    let thread = top.supporting_detail.best_thread.as_ref().unwrap();
    assert_eq!(thread.confidence_tier, ConfidenceTier::High);
    let sat = thread.nodes.iter().find(|n| n.term == "sat").unwrap();
    assert!(sat.is_boost);
    assert_eq!(sat.direction, Direction::Right);
    assert_relative_eq!(sat.strength, 1.0);
    assert_eq!(top.supporting_detail.matched_terms, vec!["cat", "sat"]);
}

/// Test 2: Balanced signals outrank a single strong signal.
#[test]
fn balanced_signals_beat_lopsided() {
    let scorer = StasisScorer::new(0.05);
    let balanced = scorer.score_values("balanced", &[0.9, 0.1, 0.5]);
    let lopsided = scorer.score_values("lopsided", &[0.9, 0.0, 0.0]);

    assert_relative_eq!(balanced.mean, 0.5, epsilon = 1e-12);
    assert_relative_eq!(balanced.variance, 0.32 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(balanced.score, 0.5 / (1.0 + 0.32 / 3.0), epsilon = 1e-12);
    assert!(balanced.passed);

    assert_relative_eq!(lopsided.mean, 0.3, epsilon = 1e-12);
    assert_relative_eq!(lopsided.variance, 0.18, epsilon = 1e-12);
    assert!(lopsided.passed);
    assert!(lopsided.score < balanced.score);
}

/// Test 3: Cross-referencing off orders purely by supplier similarity.
#[test]
fn bypass_orders_by_similarity() {
    let supplier = FixedSupplier::new(CHAT_LOG);
    let engine = RankEngine::new(&supplier);
    let options = RankOptions {
        use_cross_reference: false,
        top_k: 10,
        ..RankOptions::default()
    };

    let results = engine.rank("staging pipeline", &options).unwrap();
    let order: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
    assert_eq!(order, vec!["m1", "m2", "m4", "m3"]);
    for r in &results {
        assert_eq!(r.source, Source::Similarity);
        assert!(r.supporting_detail.stasis.is_none());
        assert!(r.supporting_detail.best_thread.is_none());
    }
}

/// Test 4: Same inputs, same output.
#[test]
fn rank_is_idempotent() {
    let supplier = FixedSupplier::new(CHAT_LOG);
    let engine = RankEngine::new(&supplier);
    let options = RankOptions::default().with_boundary_markers(["alice", "bob", "carol"]);

    let first = engine.rank("staging credentials pipeline", &options).unwrap();
    let second = engine.rank("staging credentials pipeline", &options).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

/// Test 5: Boundary markers keep a chain inside its message.
#[test]
fn boundary_markers_fence_threads() {
    let supplier = FixedSupplier::new(&[("log", "tacos again bob: tacos great", 0.5)]);
    let engine = RankEngine::new(&supplier);
    let options = RankOptions::default().with_boundary_markers(["alice", "bob"]);

    let results = engine.rank("tacos great", &options).unwrap();
    let detail = &results[0].supporting_detail;
    assert_eq!(detail.thread_count, 2);

    let best = detail.best_thread.as_ref().unwrap();
    assert_eq!(best.segment, 1);
    assert!(best.nodes.iter().all(|n| n.term != "again"));
}

/// Test 6: A query made only of stop terms yields nothing.
#[test]
fn stop_term_query_is_empty() {
    let supplier = FixedSupplier::new(CHAT_LOG);
    let engine = RankEngine::new(&supplier);
    let results = engine.rank("the of and", &RankOptions::default()).unwrap();
    assert!(results.is_empty());
}

/// Test 7: Candidate-scoped stats pick the anchor among the hits only.
#[test]
fn candidate_scope_changes_anchor_stats() {
    let supplier = FixedSupplier::new(CHAT_LOG);
    let engine = RankEngine::new(&supplier);
    let options = RankOptions {
        term_stats_scope: stasis_core::TermStatsScope::Candidates,
        candidate_pool: 2,
        ..RankOptions::default()
    };

    let results = engine.rank("cluster disk", &options).unwrap();
    let m2 = results.iter().find(|r| r.chunk_id == "m2").unwrap();
    let thread = m2.supporting_detail.best_thread.as_ref().unwrap();
    assert_eq!(thread.anchor_term, "disk");
}

fn chunk_from(words: &[&str]) -> Chunk {
    let config = TokenizerConfig::new(
        ["the".to_string()].into_iter().collect(),
        boundary_markers(["bnd"]),
    );
    Chunk::new("p", words.join(" "), 0, None, &config).unwrap()
}

fn word() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["cat", "sat", "mat", "dog", "the", "bnd"])
}

proptest! {
    #[test]
    fn identical_signals_score_exactly(v in 0.0f64..=1.0) {
        prop_assert_eq!(stasis_score(&[v, v, v]), v);
    }

    #[test]
    fn score_stays_in_unit_interval(a in 0.0f64..=1.0, b in 0.0f64..=1.0, c in 0.0f64..=1.0) {
        let s = stasis_score(&[a, b, c]);
        prop_assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn chains_respect_boundaries_and_stop_terms(
        words in prop::collection::vec(word(), 1..40),
        decay in 0.5f64..0.99,
    ) {
        let chunk = chunk_from(&words);
        let query = ChainQuery::new("cat", ["sat"]);
        let params = PropagationParams { decay_rate: decay, ..PropagationParams::default() };

        for thread in assemble_threads([&chunk], &query, &params) {
            for node in &thread.nodes {
                let token = &chunk.tokens[node.token_position];
                prop_assert!(!token.is_boundary && !token.is_stop_term);
                prop_assert!(node.strength >= params.strength_floor && node.strength <= 1.0);

                let (lo, hi) = if node.token_position < thread.anchor_position {
                    (node.token_position, thread.anchor_position)
                } else {
                    (thread.anchor_position, node.token_position)
                };
                let blocked = chunk.tokens[lo + 1..hi]
                    .iter()
                    .any(|t| t.is_boundary || t.is_stop_term);
                prop_assert!(!blocked, "node {} reached past a stop or boundary", node.token_position);
            }
        }
    }

    #[test]
    fn ranking_is_idempotent_over_random_text(
        query in prop::collection::vec(word(), 1..5),
        texts in prop::collection::vec((prop::collection::vec(word(), 1..20), 0.0f64..=1.0), 1..6),
    ) {
        let candidates: Vec<Candidate> = texts
            .iter()
            .enumerate()
            .map(|(ordinal, (words, similarity))| Candidate {
                chunk_id: format!("c{ordinal}"),
                text: words.join(" "),
                similarity: *similarity,
                ordinal,
                source_timestamp: None,
            })
            .collect();
        let query = query.join(" ");
        let options = RankOptions::default().with_boundary_markers(["bnd"]);

        let first = rank_candidates(&query, &candidates, None, &options).unwrap();
        let second = rank_candidates(&query, &candidates, None, &options).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn boosts_never_lower_strength(words in prop::collection::vec(word(), 1..40)) {
        let chunk = chunk_from(&words);
        let query = ChainQuery::new("cat", ["sat", "mat"]);
        let params = PropagationParams::default();

        for thread in assemble_threads([&chunk], &query, &params) {
            for direction in [Direction::Left, Direction::Right] {
                let mut pass: Vec<_> = thread.nodes.iter().filter(|n| n.direction == direction).collect();
                if direction == Direction::Left {
                    pass.reverse();
                }
                let mut before = 1.0;
                for node in pass {
                    let decayed = before * params.decay_rate;
                    if node.is_boost {
                        prop_assert!(node.strength >= decayed);
                    }
                    before = node.strength;
                }
            }
        }
    }
}
