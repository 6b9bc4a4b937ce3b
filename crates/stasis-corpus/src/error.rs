use std::fmt;

#[derive(Debug)]
pub enum CorpusError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Toml(toml::de::Error),
    Http(reqwest::Error),
    /// The embedding backend answered, but not with usable vectors.
    Embedding(String),
    InvalidData(String),
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusError::Io(e) => write!(f, "I/O error: {e}"),
            CorpusError::Json(e) => write!(f, "JSON error: {e}"),
            CorpusError::Toml(e) => write!(f, "config error: {e}"),
            CorpusError::Http(e) => write!(f, "HTTP error: {e}"),
            CorpusError::Embedding(msg) => write!(f, "embedding error: {msg}"),
            CorpusError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for CorpusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CorpusError::Io(e) => Some(e),
            CorpusError::Json(e) => Some(e),
            CorpusError::Toml(e) => Some(e),
            CorpusError::Http(e) => Some(e),
            CorpusError::Embedding(_) | CorpusError::InvalidData(_) => None,
        }
    }
}

impl From<std::io::Error> for CorpusError {
    fn from(e: std::io::Error) -> Self {
        CorpusError::Io(e)
    }
}

impl From<serde_json::Error> for CorpusError {
    fn from(e: serde_json::Error) -> Self {
        CorpusError::Json(e)
    }
}

impl From<toml::de::Error> for CorpusError {
    fn from(e: toml::de::Error) -> Self {
        CorpusError::Toml(e)
    }
}

impl From<reqwest::Error> for CorpusError {
    fn from(e: reqwest::Error) -> Self {
        CorpusError::Http(e)
    }
}

pub type Result<T> = std::result::Result<T, CorpusError>;
