//! The seam to the external vector store and embedding model.
//!
//! The core never embeds text or searches vectors itself. A supplier hands
//! over already-resolved candidates with their similarity, plus the whole
//! corpus for term statistics. Retries and timeouts are the supplier's job.

use serde::{Deserialize, Serialize};

/// A search hit from the supplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub chunk_id: String,
    pub text: String,
    /// Semantic similarity to the query, expected in [0, 1].
    pub similarity: f64,
    /// Position of the chunk in the supplier's ingestion order.
    pub ordinal: usize,
    #[serde(default)]
    pub source_timestamp: Option<i64>,
}

/// A raw corpus entry as stored by the supplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    pub chunk_id: String,
    pub text: String,
    pub ordinal: usize,
    #[serde(default)]
    pub source_timestamp: Option<i64>,
}

pub trait CandidateSupplier {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Nearest chunks to `query`, best first, at most `top_n`.
    fn search(&self, query: &str, top_n: usize) -> Result<Vec<Candidate>, Self::Error>;

    /// Every chunk in the corpus, in ingestion order.
    fn all_chunks(&self) -> Result<Vec<SourceChunk>, Self::Error>;
}

impl<S: CandidateSupplier + ?Sized> CandidateSupplier for &S {
    type Error = S::Error;

    fn search(&self, query: &str, top_n: usize) -> Result<Vec<Candidate>, Self::Error> {
        (**self).search(query, top_n)
    }

    fn all_chunks(&self) -> Result<Vec<SourceChunk>, Self::Error> {
        (**self).all_chunks()
    }
}
