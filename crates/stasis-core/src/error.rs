use std::error::Error;
use std::fmt;

/// Why a piece of text could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// Bytes are not valid UTF-8; `offset` is the first bad byte.
    InvalidUtf8 { offset: usize },
    /// A non-whitespace control character (NUL, escape, ...) at byte `offset`.
    ControlCharacter { offset: usize },
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeError::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 at byte {offset}")
            }
            TokenizeError::ControlCharacter { offset } => {
                write!(f, "non-text control character at byte {offset}")
            }
        }
    }
}

impl Error for TokenizeError {}

#[derive(Debug)]
pub enum RankError {
    /// The query has no usable terms once stop terms and boundaries are removed.
    EmptyQuery,
    /// Every query term is a stop term or absent from the corpus.
    NoEligibleAnchor,
    /// The candidate supplier (vector store or embedder) failed.
    CollaboratorUnavailable {
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    /// A candidate's text could not be tokenized.
    MalformedChunk {
        chunk_id: String,
        source: TokenizeError,
    },
    InvalidOptions(String),
}

impl RankError {
    pub fn collaborator(source: impl Error + Send + Sync + 'static) -> Self {
        RankError::CollaboratorUnavailable {
            source: Box::new(source),
        }
    }
}

impl fmt::Display for RankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankError::EmptyQuery => write!(f, "query has no usable terms"),
            RankError::NoEligibleAnchor => write!(f, "no query term is eligible as an anchor"),
            RankError::CollaboratorUnavailable { source } => {
                write!(f, "candidate supplier unavailable: {source}")
            }
            RankError::MalformedChunk { chunk_id, source } => {
                write!(f, "malformed chunk {chunk_id}: {source}")
            }
            RankError::InvalidOptions(msg) => write!(f, "invalid options: {msg}"),
        }
    }
}

impl Error for RankError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RankError::CollaboratorUnavailable { source } => Some(source.as_ref()),
            RankError::MalformedChunk { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;
