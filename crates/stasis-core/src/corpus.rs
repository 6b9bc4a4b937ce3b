use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RankError, Result};
use crate::tokenizer::{Token, TokenizerConfig, tokenize_chunk};

/// A tokenized passage. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    /// Ingestion order reported by the supplier.
    pub ordinal: usize,
    pub source_timestamp: Option<i64>,
    pub tokens: Vec<Token>,
}

impl Chunk {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        ordinal: usize,
        source_timestamp: Option<i64>,
        config: &TokenizerConfig,
    ) -> Result<Self> {
        let id = id.into();
        let text = text.into();
        let tokens = tokenize_chunk(&text, config).map_err(|source| RankError::MalformedChunk {
            chunk_id: id.clone(),
            source,
        })?;
        Ok(Self {
            id,
            text,
            ordinal,
            source_timestamp,
            tokens,
        })
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Distinct token texts in this chunk.
    pub fn terms(&self) -> HashSet<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Positions at which `term` occurs, ascending.
    pub fn positions_of<'a>(&'a self, term: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.tokens
            .iter()
            .filter(move |t| t.text == term)
            .map(|t| t.position)
    }

    /// Index of the boundary-delimited segment containing `position`:
    /// the number of boundary tokens strictly before it.
    pub fn segment_of(&self, position: usize) -> usize {
        self.tokens
            .iter()
            .take(position)
            .filter(|t| t.is_boundary)
            .count()
    }
}

/// Chunk-level document frequencies: how many chunks contain each term.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TermStats {
    doc_freq: HashMap<String, usize>,
    num_chunks: usize,
}

impl TermStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chunks<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> Self {
        let mut stats = Self::new();
        for chunk in chunks {
            stats.observe(chunk);
        }
        stats
    }

    pub fn observe(&mut self, chunk: &Chunk) {
        self.num_chunks += 1;
        for term in chunk.terms() {
            *self.doc_freq.entry(term.to_string()).or_default() += 1;
        }
    }

    pub fn frequency(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    pub fn vocabulary_size(&self) -> usize {
        self.doc_freq.len()
    }

    /// The `n` least frequent terms, ties broken alphabetically.
    pub fn rarest(&self, n: usize) -> Vec<(String, usize)> {
        let mut terms: Vec<(String, usize)> = self
            .doc_freq
            .iter()
            .map(|(t, f)| (t.clone(), *f))
            .collect();
        terms.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(n);
        terms
    }
}
