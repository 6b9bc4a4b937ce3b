//! Stasis ranking engine.
//!
//! Ranks retrieved text chunks with two independent relevance paths:
//! Stasis (cross-signal agreement: `mean / (1 + variance)` over similarity,
//! keyword overlap and length signals) and gradient proximity (strength
//! radiating from the rarest query term across neighbouring tokens, with
//! decay, boosts and hard boundaries). Results from both paths are merged
//! into one ordered list.
//!
//! Zero I/O. Retrieval is delegated to a [`CandidateSupplier`].

pub mod anchor;
pub mod constants;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod options;
pub mod propagate;
pub mod rank;
pub mod signals;
pub mod stasis;
pub mod supplier;
pub mod thread;
pub mod tokenizer;

pub use anchor::{Anchor, select_anchor};
pub use corpus::{Chunk, TermStats};
pub use engine::{RankEngine, rank_candidates, tokenize_candidates};
pub use error::{RankError, Result, TokenizeError};
pub use options::{RankOptions, RankSettings, TermStatsScope};
pub use propagate::{ChainNode, ChainQuery, Direction, PropagationParams, propagate};
pub use rank::{RankWeights, RankedResult, ResultRanker, Source, SupportingDetail};
pub use signals::{LengthBand, ScoredChunk, SignalCollector, SignalVector};
pub use stasis::{StasisResult, StasisScorer, stasis_score};
pub use supplier::{Candidate, CandidateSupplier, SourceChunk};
pub use thread::{ConfidenceTier, Thread, assemble_threads};
pub use tokenizer::{
    BoundaryPredicate, Token, TokenizerConfig, boundary_markers, default_stop_terms, no_boundaries,
    query_terms, tokenize, tokenize_bytes, tokenize_chunk, usable_terms,
};
