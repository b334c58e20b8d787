//! Player Matching Pipeline
//!
//! Resolves free-text roster rows against a reference population:
//! normalize -> nickname expansion -> surname blocking -> scoring ->
//! disambiguation, driven over whole batches by [`BatchMatcher`].

pub mod batch;
pub mod blocking;
pub mod disambiguate;
pub mod nickname;
pub mod normalize;
pub mod scorer;
pub mod team;

pub use batch::{BatchMatcher, BatchOutput};
pub use blocking::{block_key, BlockingIndex, IndexedRecord};
pub use disambiguate::{ClaimedSet, Disambiguator};
pub use nickname::NicknameTable;
pub use normalize::{normalize, NormalizedName};
pub use scorer::{PreparedQuery, SimilarityScorer};
pub use team::TeamAliases;

/// Normalized edit similarity (0-1). Empty strings never match anything.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("smith", "smith"), 1.0);
        assert!((similarity("johnson", "johnston") - 0.875).abs() < 1e-9);
        assert!((similarity("smith", "smyth") - 0.8).abs() < 1e-9);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("doe", ""), 0.0);
    }
}
