/// Minimum Stasis score a candidate needs to pass the filter.
pub const DEFAULT_STASIS_THRESHOLD: f64 = 0.05;

/// Results returned by a ranking call.
pub const DEFAULT_TOP_K: usize = 5;

/// Candidates requested from the supplier per query.
pub const DEFAULT_CANDIDATE_POOL: usize = 20;

/// Per-step multiplicative strength decay during propagation.
pub const DEFAULT_DECAY_RATE: f64 = 0.85;

/// Strength added when propagation meets another query term.
pub const DEFAULT_BOOST_AMOUNT: f64 = 0.3;

/// Propagation stops once strength drops below this.
pub const DEFAULT_STRENGTH_FLOOR: f64 = 0.01;

/// Strength at or above which a thread is high confidence.
pub const HIGH_CONFIDENCE: f64 = 0.6;

/// Strength at or above which a thread is medium confidence.
pub const MEDIUM_CONFIDENCE: f64 = 0.3;

/// Ideal chunk length band (tokens, inclusive) for the length signal.
pub const DEFAULT_IDEAL_MIN_TOKENS: usize = 8;
pub const DEFAULT_IDEAL_MAX_TOKENS: usize = 256;

/// Tokens outside the ideal band over which the length signal falls from 1.0 to 0.0.
pub const DEFAULT_LENGTH_FALLOFF: usize = 128;

/// Built-in stop terms. Propagation halts on these and they never anchor a chain.
pub const DEFAULT_STOP_TERMS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "can", "this", "that", "these",
    "those", "i", "you", "he", "she", "it", "we", "they", "what", "which", "who", "when",
    "where", "why", "how", "kind", "type", "sort", "stuff", "thing", "things", "way", "ways",
    "lot", "lots", "much", "many", "some", "any", "all", "more", "most", "other", "another",
    "such", "just", "very", "too", "also", "even", "really", "quite", "pretty", "actually",
    "basically", "literally",
];
