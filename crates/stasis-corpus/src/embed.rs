//! Text embedders used by [`MemoryCorpus`](crate::MemoryCorpus) to compute
//! similarities.
//!
//! - [`HashEmbedder`]: deterministic signed feature hashing over content
//!   words. No model, no network; good enough for keyword-ish recall and tests.
//! - [`HttpEmbedder`]: any OpenAI-compatible `/v1/embeddings` endpoint.
//! - [`cosine_similarity`]: similarity between two vectors.

use std::collections::HashSet;
use std::time::Duration;

use stasis_core::{default_stop_terms, tokenize};

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::{CorpusError, Result};

pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dims(&self) -> usize;

    /// One vector per input text, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| CorpusError::Embedding("no vector returned".to_string()))
    }
}

pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::Hash => Ok(Box::new(HashEmbedder::new(settings.dims))),
        EmbeddingProvider::OpenAi => Ok(Box::new(HttpEmbedder::new(settings)?)),
    }
}

// ============ Feature hashing ============

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

pub struct HashEmbedder {
    dims: usize,
    ignored: HashSet<String>,
}

impl HashEmbedder {
    /// Stop terms are left out of the vector so function words do not
    /// dominate similarity.
    pub fn new(dims: usize) -> Self {
        Self {
            dims: dims.max(1),
            ignored: default_stop_terms(),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for word in tokenize(text) {
            if self.ignored.contains(&word) {
                continue;
            }
            let h = fnv1a(word.as_bytes());
            let bucket = (h % self.dims as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "feature-hash"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

// ============ OpenAI-compatible HTTP ============

pub struct HttpEmbedder {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
    dims: usize,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::debug!(
                "{} not set; calling {} without auth",
                settings.api_key_env,
                settings.url
            );
        }
        Ok(Self {
            client,
            url: settings.url.clone(),
            model: settings.model.clone(),
            dims: settings.dims,
            api_key,
        })
    }
}

impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(CorpusError::Embedding(format!(
                "{} returned {status}: {text}",
                self.url
            )));
        }

        let json: serde_json::Value = response.json()?;
        let vectors = parse_embeddings_response(&json)?;
        if vectors.len() != texts.len() {
            return Err(CorpusError::Embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index` when present.
pub fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| CorpusError::Embedding("response missing data array".to_string()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| CorpusError::Embedding("response item missing embedding".to_string()))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map_or(position, |i| i as usize);
        let vector = embedding
            .iter()
            .map(|v| {
                v.as_f64().map(|x| x as f32).ok_or_else(|| {
                    CorpusError::Embedding(format!("non-numeric embedding component {v}"))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

/// Cosine similarity in `[-1.0, 1.0]`; 0.0 for empty, mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}
