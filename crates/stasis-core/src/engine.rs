use std::collections::{HashMap, HashSet};

use crate::anchor::{Anchor, select_anchor};
use crate::corpus::{Chunk, TermStats};
use crate::error::{RankError, Result};
use crate::options::{RankOptions, TermStatsScope};
use crate::propagate::ChainQuery;
use crate::rank::RankedResult;
use crate::signals::ScoredChunk;
use crate::supplier::{Candidate, CandidateSupplier};
use crate::thread::{Thread, assemble_threads};
use crate::tokenizer::{Token, TokenizerConfig, tokenize_chunk, usable_terms};

/// Query entry point bound to a candidate supplier.
///
/// Holds no per-query state: every call builds its own signals, threads and
/// results and drops them on return.
pub struct RankEngine<S> {
    supplier: S,
}

impl<S: CandidateSupplier> RankEngine<S> {
    pub fn new(supplier: S) -> Self {
        Self { supplier }
    }

    pub fn supplier(&self) -> &S {
        &self.supplier
    }

    /// Full pipeline: search → {signals → Stasis} + {anchor → propagate →
    /// threads} → merge.
    pub fn rank(&self, query: &str, options: &RankOptions) -> Result<Vec<RankedResult>> {
        options.validate()?;
        let config = options.tokenizer_config();
        let Some((_, terms)) = parse_query(query, &config) else {
            tracing::debug!("query has no usable terms; returning no results");
            return Ok(Vec::new());
        };
        tracing::debug!("query terms: {terms:?}");

        let candidates = self
            .supplier
            .search(query, options.candidate_pool)
            .map_err(RankError::collaborator)?;
        tracing::debug!("supplier returned {} candidates", candidates.len());

        let corpus_stats = match options.term_stats_scope {
            TermStatsScope::Corpus if options.use_cross_reference => {
                Some(self.term_stats(&config)?)
            }
            _ => None,
        };

        rank_candidates(query, &candidates, corpus_stats.as_ref(), options)
    }

    /// Chunk frequencies over the supplier's whole corpus.
    pub fn term_stats(&self, config: &TokenizerConfig) -> Result<TermStats> {
        let chunks = self
            .supplier
            .all_chunks()
            .map_err(RankError::collaborator)?;

        let mut stats = TermStats::new();
        for source in chunks {
            match Chunk::new(
                source.chunk_id,
                source.text,
                source.ordinal,
                source.source_timestamp,
                config,
            ) {
                Ok(chunk) => stats.observe(&chunk),
                Err(e) => tracing::warn!("skipping corpus chunk for term stats: {e}"),
            }
        }
        Ok(stats)
    }

    /// The anchor `rank` would propagate from, using corpus-wide statistics.
    pub fn anchor(&self, query: &str, options: &RankOptions) -> Result<Anchor> {
        let config = options.tokenizer_config();
        let (tokens, _) = parse_query(query, &config).ok_or(RankError::EmptyQuery)?;
        let stats = self.term_stats(&config)?;
        select_anchor(&tokens, &stats)
    }
}

fn parse_query(query: &str, config: &TokenizerConfig) -> Option<(Vec<Token>, Vec<String>)> {
    let tokens = tokenize_chunk(query, config).ok()?;
    let terms = usable_terms(&tokens);
    (!terms.is_empty()).then_some((tokens, terms))
}

/// Tokenize supplier candidates. Candidates that cannot be tokenized are
/// logged and dropped, as are repeats of an id already seen; the rest carry on.
pub fn tokenize_candidates(candidates: &[Candidate], config: &TokenizerConfig) -> Vec<ScoredChunk> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter_map(|c| {
            if !seen.insert(c.chunk_id.as_str()) {
                tracing::warn!("dropping duplicate candidate {}", c.chunk_id);
                return None;
            }
            match Chunk::new(
                c.chunk_id.clone(),
                c.text.clone(),
                c.ordinal,
                c.source_timestamp,
                config,
            ) {
                Ok(chunk) => Some(ScoredChunk {
                    chunk,
                    similarity: c.similarity,
                }),
                Err(e) => {
                    tracing::warn!("dropping candidate: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Rank already-retrieved candidates. `corpus_stats` feeds anchor rarity;
/// when absent, frequencies are taken from the candidates themselves.
pub fn rank_candidates(
    query: &str,
    candidates: &[Candidate],
    corpus_stats: Option<&TermStats>,
    options: &RankOptions,
) -> Result<Vec<RankedResult>> {
    options.validate()?;
    let config = options.tokenizer_config();
    let Some((query_tokens, terms)) = parse_query(query, &config) else {
        return Ok(Vec::new());
    };

    let scored = tokenize_candidates(candidates, &config);

    if !options.use_cross_reference {
        tracing::debug!("cross-reference disabled; ranking by similarity");
        return Ok(options
            .ranker()
            .by_similarity(scored.iter().map(|c| (c.chunk.id.clone(), c.similarity))));
    }

    let signals = options.signal_collector().collect(&terms, &scored);
    let stasis = options.stasis_scorer().score_all(&signals);
    tracing::debug!(
        "stasis: {}/{} candidates passed threshold {}",
        stasis.iter().filter(|s| s.passed).count(),
        stasis.len(),
        options.stasis_threshold
    );

    let candidate_stats;
    let stats = match corpus_stats {
        Some(stats) => stats,
        None => {
            candidate_stats = TermStats::from_chunks(scored.iter().map(|c| &c.chunk));
            &candidate_stats
        }
    };
    let threads = gradient_threads(&query_tokens, &terms, &scored, stats, options);

    let similarities: HashMap<String, f64> = scored
        .iter()
        .map(|c| (c.chunk.id.clone(), c.similarity))
        .collect();

    Ok(options.ranker().merge(&stasis, &threads, &similarities))
}

fn gradient_threads(
    query_tokens: &[Token],
    terms: &[String],
    scored: &[ScoredChunk],
    stats: &TermStats,
    options: &RankOptions,
) -> Vec<Thread> {
    let anchor = match select_anchor(query_tokens, stats) {
        Ok(anchor) => anchor,
        Err(e) => {
            tracing::debug!("{e}; falling back to stasis-only ranking");
            return Vec::new();
        }
    };

    let common_limit = options.boost_commonality_ratio * stats.num_chunks() as f64;
    let boost_terms = terms
        .iter()
        .filter(|t| stats.frequency(t) as f64 <= common_limit)
        .cloned();
    let chain = ChainQuery::new(anchor.term.as_str(), boost_terms);

    let threads = assemble_threads(
        scored.iter().map(|c| &c.chunk),
        &chain,
        &options.propagation_params(),
    );
    tracing::debug!(
        "anchor '{}' (frequency {}) produced {} threads",
        anchor.term,
        anchor.corpus_frequency,
        threads.len()
    );
    threads
}
