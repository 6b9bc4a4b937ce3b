use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_STOP_TERMS;
use crate::error::{RankError, Result, TokenizeError};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\w']+").unwrap());

/// Decides whether a (lowercased) token marks a conversational or topical seam.
pub type BoundaryPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Boundary predicate that never fires.
pub fn no_boundaries() -> BoundaryPredicate {
    Arc::new(|_| false)
}

/// Boundary predicate matching a fixed set of marker words, e.g. speaker names
/// that open every message in a chat log.
pub fn boundary_markers<I, S>(markers: I) -> BoundaryPredicate
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: HashSet<String> = markers
        .into_iter()
        .map(|m| m.as_ref().to_lowercase())
        .collect();
    Arc::new(move |token| set.contains(token))
}

pub fn default_stop_terms() -> HashSet<String> {
    DEFAULT_STOP_TERMS.iter().map(|t| t.to_string()).collect()
}

/// A word of a chunk with its flags.
///
/// `span` is the byte range the token owns in the source text: the word itself
/// plus the separators that follow it (the first token also owns any leading
/// separators), so consecutive spans tile the whole text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub position: usize,
    pub span: Range<usize>,
    pub is_boundary: bool,
    pub is_stop_term: bool,
}

#[derive(Clone)]
pub struct TokenizerConfig {
    pub stop_terms: HashSet<String>,
    pub boundary: BoundaryPredicate,
}

impl TokenizerConfig {
    pub fn new(stop_terms: HashSet<String>, boundary: BoundaryPredicate) -> Self {
        Self {
            stop_terms: stop_terms.into_iter().map(|t| t.to_lowercase()).collect(),
            boundary,
        }
    }

    pub fn is_stop_term(&self, term: &str) -> bool {
        self.stop_terms.contains(term)
    }

    pub fn is_boundary(&self, term: &str) -> bool {
        (self.boundary)(term)
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            stop_terms: default_stop_terms(),
            boundary: no_boundaries(),
        }
    }
}

impl fmt::Debug for TokenizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizerConfig")
            .field("stop_terms", &self.stop_terms.len())
            .finish_non_exhaustive()
    }
}

/// Tokenize text into lowercase words.
/// Preserves apostrophes within words (e.g., "don't"). No stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    words(text).into_iter().map(|(_, w)| w).collect()
}

fn words(text: &str) -> Vec<(usize, String)> {
    WORD.find_iter(text)
        .filter_map(|m| {
            let word = m.as_str().trim_matches('\'');
            (!word.is_empty()).then(|| (m.start(), word.to_lowercase()))
        })
        .collect()
}

/// Tokenize chunk text into a positional token sequence with boundary and
/// stop-term flags. Text containing non-whitespace control characters is
/// rejected as a whole.
pub fn tokenize_chunk(
    text: &str,
    config: &TokenizerConfig,
) -> std::result::Result<Vec<Token>, TokenizeError> {
    if let Some((offset, _)) = text
        .char_indices()
        .find(|(_, c)| c.is_control() && !c.is_whitespace())
    {
        return Err(TokenizeError::ControlCharacter { offset });
    }

    let words = words(text);
    let mut tokens = Vec::with_capacity(words.len());

    for (position, (start, word)) in words.iter().enumerate() {
        let span_start = if position == 0 { 0 } else { *start };
        let span_end = words.get(position + 1).map_or(text.len(), |(next, _)| *next);
        tokens.push(Token {
            is_boundary: config.is_boundary(word),
            is_stop_term: config.is_stop_term(word),
            text: word.clone(),
            position,
            span: span_start..span_end,
        });
    }

    Ok(tokens)
}

/// Byte-level entry point for suppliers that hand over raw payloads.
pub fn tokenize_bytes(
    bytes: &[u8],
    config: &TokenizerConfig,
) -> std::result::Result<Vec<Token>, TokenizeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| TokenizeError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    tokenize_chunk(text, config)
}

/// Distinct token texts in order, stop terms and boundary markers removed.
pub fn usable_terms(tokens: &[Token]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|t| !t.is_stop_term && !t.is_boundary)
        .filter(|t| seen.insert(t.text.as_str()))
        .map(|t| t.text.clone())
        .collect()
}

/// Distinct usable query terms in query order. A query that cannot be
/// tokenized has no usable terms.
pub fn query_terms(query: &str, config: &TokenizerConfig) -> Result<Vec<String>> {
    let tokens = tokenize_chunk(query, config).map_err(|_| RankError::EmptyQuery)?;
    let terms = usable_terms(&tokens);
    if terms.is_empty() {
        return Err(RankError::EmptyQuery);
    }
    Ok(terms)
}
