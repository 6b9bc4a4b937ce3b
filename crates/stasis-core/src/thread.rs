use serde::{Deserialize, Serialize};

use crate::constants::{HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};
use crate::corpus::Chunk;
use crate::propagate::{ChainNode, ChainQuery, PropagationParams, chains_in_chunk};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn from_strength(max_strength: f64) -> Self {
        if max_strength >= HIGH_CONFIDENCE {
            ConfidenceTier::High
        } else if max_strength >= MEDIUM_CONFIDENCE {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// The chained hits around one anchor occurrence in one chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub chunk_id: String,
    pub anchor_position: usize,
    pub anchor_term: String,
    /// Boundary-delimited segment (message) the anchor sits in.
    pub segment: usize,
    /// Ordered by token position.
    pub nodes: Vec<ChainNode>,
    pub confidence_tier: ConfidenceTier,
}

impl Thread {
    pub fn new(
        chunk: &Chunk,
        anchor_position: usize,
        anchor_term: &str,
        nodes: Vec<ChainNode>,
    ) -> Self {
        let max = max_strength(&nodes);
        Self {
            chunk_id: chunk.id.clone(),
            anchor_position,
            anchor_term: anchor_term.to_string(),
            segment: chunk.segment_of(anchor_position),
            nodes,
            confidence_tier: ConfidenceTier::from_strength(max),
        }
    }

    /// Strongest node; 0.0 for a thread with no reachable neighbours.
    pub fn max_strength(&self) -> f64 {
        max_strength(&self.nodes)
    }

    pub fn boost_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_boost).count()
    }

    /// Anchor term followed by each distinct boosted term in token order.
    pub fn matched_terms(&self) -> Vec<String> {
        let mut terms = vec![self.anchor_term.clone()];
        for node in self.nodes.iter().filter(|n| n.is_boost) {
            if !terms.contains(&node.term) {
                terms.push(node.term.clone());
            }
        }
        terms
    }

    /// First and last token positions covered, anchor included.
    pub fn span(&self) -> (usize, usize) {
        let first = self
            .nodes
            .first()
            .map_or(self.anchor_position, |n| n.token_position.min(self.anchor_position));
        let last = self
            .nodes
            .last()
            .map_or(self.anchor_position, |n| n.token_position.max(self.anchor_position));
        (first, last)
    }
}

fn max_strength(nodes: &[ChainNode]) -> f64 {
    nodes.iter().map(|n| n.strength).fold(0.0, f64::max)
}

/// Run propagation over `chunks` and gather one thread per anchor
/// occurrence. Threads are grouped by chunk in ingestion order and ordered by
/// anchor position within a chunk.
pub fn assemble_threads<'a>(
    chunks: impl IntoIterator<Item = &'a Chunk>,
    query: &ChainQuery,
    params: &PropagationParams,
) -> Vec<Thread> {
    let mut chunks: Vec<&Chunk> = chunks.into_iter().collect();
    chunks.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.id.cmp(&b.id)));

    chunks
        .into_iter()
        .flat_map(|chunk| {
            chains_in_chunk(chunk, query, params)
                .into_iter()
                .map(move |(position, nodes)| Thread::new(chunk, position, &query.anchor, nodes))
        })
        .collect()
}

/// The thread with the strongest node; earlier anchors win ties.
pub fn best_thread<'a>(threads: impl IntoIterator<Item = &'a Thread>) -> Option<&'a Thread> {
    threads.into_iter().fold(None, |best: Option<&Thread>, t| match best {
        Some(b) if b.max_strength() >= t.max_strength() => Some(b),
        _ => Some(t),
    })
}
