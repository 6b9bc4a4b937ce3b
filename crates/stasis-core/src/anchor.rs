use serde::{Deserialize, Serialize};

use crate::corpus::TermStats;
use crate::error::{RankError, Result};
use crate::tokenizer::Token;

/// The rarest usable query term; propagation starts from its occurrences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub term: String,
    pub corpus_frequency: usize,
}

/// Pick the query term with the lowest chunk frequency.
///
/// Stop terms and boundary markers are never eligible. Terms that never
/// occur in the corpus cannot anchor anything and are skipped. Ties go to the
/// term that comes first in the query.
pub fn select_anchor(query: &[Token], stats: &TermStats) -> Result<Anchor> {
    let mut best: Option<Anchor> = None;

    for token in query.iter().filter(|t| !t.is_stop_term && !t.is_boundary) {
        let term = &token.text;
        let frequency = stats.frequency(term);
        if frequency == 0 {
            continue;
        }
        if best.as_ref().is_none_or(|b| frequency < b.corpus_frequency) {
            best = Some(Anchor {
                term: term.clone(),
                corpus_frequency: frequency,
            });
        }
    }

    best.ok_or(RankError::NoEligibleAnchor)
}
