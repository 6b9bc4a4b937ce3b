use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stasis_core::RankSettings;

use crate::error::{CorpusError, Result};

/// Environment variable naming the config file when no path is given.
pub const CONFIG_ENV: &str = "STASIS_CONFIG";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic feature hashing, no network.
    #[default]
    Hash,
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    OpenAi,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub url: String,
    pub model: String,
    pub dims: usize,
    pub timeout_secs: u64,
    /// Variable holding the bearer token. Unset means no auth header.
    pub api_key_env: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hash,
            url: "https://api.openai.com/v1/embeddings".to_string(),
            model: "text-embedding-3-small".to_string(),
            dims: 256,
            timeout_secs: 30,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Contents of a `stasis.toml` file. Missing sections fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StasisConfig {
    pub ranking: RankSettings,
    pub embedding: EmbeddingSettings,
}

impl StasisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StasisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load `explicit`, else the file named by `STASIS_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match config_path(explicit) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.embedding.dims == 0 {
            return Err(CorpusError::InvalidData(
                "embedding.dims must be > 0".to_string(),
            ));
        }
        self.ranking
            .clone()
            .into_options()
            .validate()
            .map_err(|e| CorpusError::InvalidData(format!("ranking: {e}")))
    }
}

pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}
