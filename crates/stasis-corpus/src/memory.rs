use std::collections::HashSet;

use stasis_core::{Candidate, CandidateSupplier, SourceChunk};

use crate::embed::{Embedder, cosine_similarity};
use crate::error::{CorpusError, Result};
use crate::loader::ChunkRecord;

struct Entry {
    id: String,
    text: String,
    timestamp: Option<i64>,
    vector: Vec<f32>,
}

/// In-memory vector collection with brute-force cosine search.
///
/// Chunks keep their insertion order, which is the ordinal handed to the
/// ranking engine.
pub struct MemoryCorpus {
    embedder: Box<dyn Embedder>,
    entries: Vec<Entry>,
    ids: HashSet<String>,
}

impl MemoryCorpus {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Embed and append records in one batch. Duplicate ids are rejected
    /// before anything is embedded.
    pub fn extend(&mut self, records: Vec<ChunkRecord>) -> Result<()> {
        let mut batch_ids = HashSet::new();
        for record in &records {
            if self.ids.contains(&record.id) || !batch_ids.insert(record.id.as_str()) {
                return Err(CorpusError::InvalidData(format!(
                    "duplicate chunk id {}",
                    record.id
                )));
            }
        }

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let vectors = self.embedder.embed(&texts)?;
        if vectors.len() != records.len() {
            return Err(CorpusError::Embedding(format!(
                "expected {} vectors, got {}",
                records.len(),
                vectors.len()
            )));
        }

        for (record, vector) in records.into_iter().zip(vectors) {
            self.ids.insert(record.id.clone());
            self.entries.push(Entry {
                id: record.id,
                text: record.text,
                timestamp: record.timestamp,
                vector,
            });
        }
        tracing::debug!("corpus now holds {} chunks", self.entries.len());
        Ok(())
    }

    pub fn add(&mut self, id: impl Into<String>, text: impl Into<String>) -> Result<()> {
        self.extend(vec![ChunkRecord {
            id: id.into(),
            text: text.into(),
            timestamp: None,
        }])
    }
}

impl CandidateSupplier for MemoryCorpus {
    type Error = CorpusError;

    /// Cosine similarity clamped to `[0, 1]`; ties keep insertion order.
    fn search(&self, query: &str, top_n: usize) -> Result<Vec<Candidate>> {
        let query_vector = self.embedder.embed_one(query)?;

        let mut hits: Vec<Candidate> = self
            .entries
            .iter()
            .enumerate()
            .map(|(ordinal, entry)| Candidate {
                chunk_id: entry.id.clone(),
                text: entry.text.clone(),
                similarity: f64::from(cosine_similarity(&query_vector, &entry.vector)).max(0.0),
                ordinal,
                source_timestamp: entry.timestamp,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });
        hits.truncate(top_n);
        Ok(hits)
    }

    fn all_chunks(&self) -> Result<Vec<SourceChunk>> {
        Ok(self
            .entries
            .iter()
            .enumerate()
            .map(|(ordinal, entry)| SourceChunk {
                chunk_id: entry.id.clone(),
                text: entry.text.clone(),
                ordinal,
                source_timestamp: entry.timestamp,
            })
            .collect())
    }
}
