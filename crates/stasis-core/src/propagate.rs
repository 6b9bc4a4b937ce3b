//! Gradient proximity propagation.
//!
//! From each occurrence of the anchor term, strength radiates outward one
//! token at a time in both directions. It decays geometrically with distance
//! and is topped up whenever another query term is met, so clusters of query
//! terms chain further than a lone anchor. A pass never crosses a boundary
//! token and halts outright on a stop term.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BOOST_AMOUNT, DEFAULT_DECAY_RATE, DEFAULT_STRENGTH_FLOOR};
use crate::corpus::Chunk;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// One token reached by a propagation pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainNode {
    pub chunk_id: String,
    pub token_position: usize,
    pub term: String,
    /// In (0, 1]; never below the strength floor.
    pub strength: f64,
    pub direction: Direction,
    pub is_boost: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropagationParams {
    pub decay_rate: f64,
    pub boost_amount: f64,
    pub strength_floor: f64,
}

impl Default for PropagationParams {
    fn default() -> Self {
        Self {
            decay_rate: DEFAULT_DECAY_RATE,
            boost_amount: DEFAULT_BOOST_AMOUNT,
            strength_floor: DEFAULT_STRENGTH_FLOOR,
        }
    }
}

/// The anchor term and the other query terms that revive a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainQuery {
    pub anchor: String,
    boost_terms: HashSet<String>,
}

impl ChainQuery {
    pub fn new<I, S>(anchor: impl Into<String>, boost_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let anchor = anchor.into();
        let boost_terms = boost_terms
            .into_iter()
            .map(Into::into)
            .filter(|t| *t != anchor)
            .collect();
        Self {
            anchor,
            boost_terms,
        }
    }

    pub fn boosts(&self, term: &str) -> bool {
        self.boost_terms.contains(term)
    }
}

/// Propagate left and right from `anchor_position` and return the reached
/// nodes in token order. The anchor itself is not a node.
pub fn propagate(
    chunk: &Chunk,
    anchor_position: usize,
    query: &ChainQuery,
    params: &PropagationParams,
) -> Vec<ChainNode> {
    let mut nodes = radiate(chunk, anchor_position, Direction::Left, query, params);
    nodes.reverse();
    nodes.extend(radiate(chunk, anchor_position, Direction::Right, query, params));
    nodes
}

/// Node lists for every occurrence of the anchor in `chunk`, keyed by the
/// occurrence's position, ascending.
pub fn chains_in_chunk(
    chunk: &Chunk,
    query: &ChainQuery,
    params: &PropagationParams,
) -> Vec<(usize, Vec<ChainNode>)> {
    chunk
        .positions_of(&query.anchor)
        .map(|position| (position, propagate(chunk, position, query, params)))
        .collect()
}

fn radiate(
    chunk: &Chunk,
    anchor_position: usize,
    direction: Direction,
    query: &ChainQuery,
    params: &PropagationParams,
) -> Vec<ChainNode> {
    let mut nodes = Vec::new();
    let mut strength = 1.0_f64;
    let mut position = anchor_position;

    loop {
        position = match direction {
            Direction::Left => match position.checked_sub(1) {
                Some(p) => p,
                None => break,
            },
            Direction::Right => position + 1,
        };
        let Some(token) = chunk.tokens.get(position) else {
            break;
        };
        if token.is_boundary || token.is_stop_term {
            break;
        }

        strength *= params.decay_rate;
        let is_boost = query.boosts(&token.text);
        if is_boost {
            strength = (strength + params.boost_amount).min(1.0);
        }
        if strength < params.strength_floor {
            break;
        }

        nodes.push(ChainNode {
            chunk_id: chunk.id.clone(),
            token_position: position,
            term: token.text.clone(),
            strength,
            direction,
            is_boost,
        });
    }

    nodes
}
