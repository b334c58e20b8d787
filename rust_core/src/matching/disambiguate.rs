//! Candidate ranking, one-to-one claims and confidence classification.

use crate::config::MatcherConfig;
use crate::models::{
    CandidateScore, MatchResult, MatchTier, REASON_ALL_CLAIMED, REASON_AMBIGUOUS,
    REASON_BELOW_THRESHOLD, REASON_NEXT_UNCLAIMED, REASON_NO_CANDIDATES, Signal,
};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;

/// Reference ids already assigned during a one-to-one batch.
///
/// Passed explicitly through the batch so assignment order is an input the
/// caller controls, not hidden shared state.
#[derive(Debug, Clone, Default)]
pub struct ClaimedSet {
    ids: FxHashSet<String>,
}

impl ClaimedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, reference_id: &str) -> bool {
        self.ids.contains(reference_id)
    }

    /// Claim an id. Returns false if it was already claimed.
    pub fn claim(&mut self, reference_id: &str) -> bool {
        self.ids.insert(reference_id.to_string())
    }

    /// Fold another shard's claims into this one
    pub fn merge(&mut self, other: ClaimedSet) {
        self.ids.extend(other.ids);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(|s| s.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for ClaimedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ranking order: exact normalized name first, then adjusted score, raw
/// similarity, and presence of a birth-year signal. Callers sort stably, so
/// remaining ties keep population order.
pub fn rank_order(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    b.is_exact_name()
        .cmp(&a.is_exact_name())
        .then_with(|| b.adjusted_score.total_cmp(&a.adjusted_score))
        .then_with(|| b.raw_similarity.total_cmp(&a.raw_similarity))
        .then_with(|| b.has_birth_year_signal().cmp(&a.has_birth_year_signal()))
}

/// Turns scored candidates into a classified match result
#[derive(Debug, Clone)]
pub struct Disambiguator {
    acceptance_threshold: f64,
    high_tier: f64,
    medium_tier: f64,
    ambiguity_margin: f64,
    ambiguity_damping: f64,
}

impl Disambiguator {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            acceptance_threshold: config.acceptance_threshold,
            high_tier: config.high_tier,
            medium_tier: config.medium_tier,
            ambiguity_margin: config.ambiguity_margin,
            ambiguity_damping: config.ambiguity_damping,
        }
    }

    pub fn tier_for(&self, adjusted_score: f64) -> MatchTier {
        if adjusted_score >= self.high_tier {
            MatchTier::High
        } else if adjusted_score >= self.medium_tier {
            MatchTier::Medium
        } else if adjusted_score >= self.acceptance_threshold {
            MatchTier::Low
        } else {
            MatchTier::NoMatch
        }
    }

    /// Pick the winning candidate for one query.
    ///
    /// `claimed` is `Some` only in one-to-one mode; claimed ids are skipped in
    /// favour of the next-best unclaimed candidate. The caller records the
    /// winner in its `ClaimedSet`.
    pub fn resolve(
        &self,
        query_index: usize,
        mut candidates: Vec<CandidateScore>,
        claimed: Option<&ClaimedSet>,
    ) -> MatchResult {
        if candidates.is_empty() {
            return MatchResult::no_match(query_index, REASON_NO_CANDIDATES);
        }

        candidates.sort_by(rank_order);

        let is_free = |c: &CandidateScore| claimed.map_or(true, |set| !set.contains(&c.reference_id));
        let is_eligible = |c: &CandidateScore| c.adjusted_score >= self.acceptance_threshold;

        // Only the top-ranked unclaimed candidate is considered; a weaker
        // candidate never wins because the one above it missed the threshold.
        let top_eligible = is_eligible(&candidates[0]);
        let best_pos = candidates.iter().position(|c| is_free(c));
        let skipped_claimed = best_pos.map_or(true, |pos| pos > 0);

        let Some(best_pos) = best_pos.filter(|&pos| is_eligible(&candidates[pos])) else {
            let reason = if skipped_claimed && top_eligible {
                REASON_ALL_CLAIMED
            } else {
                REASON_BELOW_THRESHOLD
            };
            return MatchResult::no_match(query_index, reason);
        };

        let best = &candidates[best_pos];
        let runner_up = candidates[best_pos + 1..].iter().find(|c| is_free(*c));

        let tier = self.tier_for(best.adjusted_score);
        let mut confidence = best.adjusted_score;
        let mut tags: Vec<&str> = Vec::new();

        if !best.is_exact_name() && !best.signals_used.contains(&Signal::Nickname) {
            tags.push("fuzzy_name");
        }
        tags.extend(best.signals_used.iter().map(|s| s.tag()));

        if let Some(runner) = runner_up {
            if runner.adjusted_score >= best.adjusted_score * self.ambiguity_margin {
                confidence *= self.ambiguity_damping;
                tags.push(REASON_AMBIGUOUS);
            }
        }
        if skipped_claimed {
            tags.push(REASON_NEXT_UNCLAIMED);
        }

        MatchResult::matched(
            query_index,
            best.reference_id.clone(),
            confidence,
            tier,
            tags.join("+"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn candidate(id: &str, raw: f64, adjusted: f64, signals: &[Signal]) -> CandidateScore {
        CandidateScore {
            reference_id: id.to_string(),
            raw_similarity: raw,
            adjusted_score: adjusted,
            signals_used: signals.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn disambiguator() -> Disambiguator {
        Disambiguator::new(&MatcherConfig::default())
    }

    #[test]
    fn test_empty_candidates() {
        let result = disambiguator().resolve(3, Vec::new(), None);
        assert_eq!(result.tier, MatchTier::NoMatch);
        assert_eq!(result.query_index, 3);
        assert_eq!(result.reason, REASON_NO_CANDIDATES);
        assert!(result.matched_reference_id.is_none());
        assert!(result.confidence.is_none());
    }

    #[test]
    fn test_below_threshold() {
        let result = disambiguator().resolve(0, vec![candidate("p1", 0.62, 0.62, &[])], None);
        assert_eq!(result.tier, MatchTier::NoMatch);
        assert_eq!(result.reason, REASON_BELOW_THRESHOLD);
    }

    #[test]
    fn test_tiers() {
        let d = disambiguator();
        assert_eq!(d.tier_for(0.85), MatchTier::High);
        assert_eq!(d.tier_for(0.80), MatchTier::Medium);
        assert_eq!(d.tier_for(0.70), MatchTier::Low);
        assert_eq!(d.tier_for(0.50), MatchTier::NoMatch);
    }

    #[test]
    fn test_picks_highest_adjusted() {
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("p1", 0.70, 0.70, &[]),
                candidate("p2", 0.90, 0.95, &[Signal::BirthYearExact]),
            ],
            None,
        );
        assert_eq!(result.matched_reference_id.as_deref(), Some("p2"));
        assert_eq!(result.tier, MatchTier::High);
        assert_eq!(result.confidence, Some(0.95));
        assert_eq!(result.reason, "fuzzy_name+birth_year_exact");
    }

    #[test]
    fn test_exact_name_ranks_first() {
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("fuzzy", 0.93, 1.0, &[Signal::BirthYearExact, Signal::Team]),
                candidate("exact", 1.0, 0.85, &[Signal::ExactName, Signal::BirthYearMismatch]),
            ],
            None,
        );
        assert_eq!(result.matched_reference_id.as_deref(), Some("exact"));
        // The bonus-heavy runner-up is still surfaced as a near-tie
        assert!(result.is_ambiguous());
    }

    #[test]
    fn test_tie_breaks_on_raw_then_birth_year() {
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("a", 0.80, 0.90, &[]),
                candidate("b", 0.85, 0.90, &[]),
            ],
            None,
        );
        assert_eq!(result.matched_reference_id.as_deref(), Some("b"));

        let result = disambiguator().resolve(
            0,
            vec![
                candidate("a", 0.85, 0.85, &[]),
                candidate("b", 0.85, 0.85, &[Signal::BirthYearNear]),
            ],
            None,
        );
        assert_eq!(result.matched_reference_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_near_tie_is_damped() {
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("p1", 1.0, 1.0, &[Signal::ExactName]),
                candidate("p2", 0.925, 0.90, &[]),
            ],
            None,
        );
        assert_eq!(result.matched_reference_id.as_deref(), Some("p1"));
        assert_eq!(result.tier, MatchTier::High);
        assert!((result.confidence.unwrap() - 0.8).abs() < 1e-9);
        assert_eq!(result.reason, "exact_name+ambiguous");
    }

    #[test]
    fn test_clear_winner_not_damped() {
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("p1", 1.0, 1.0, &[Signal::ExactName]),
                candidate("p2", 0.66, 0.66, &[]),
            ],
            None,
        );
        assert_eq!(result.confidence, Some(1.0));
        assert!(!result.is_ambiguous());
    }

    #[test]
    fn test_claimed_candidate_is_skipped() {
        let claimed: ClaimedSet = ["p1"].into_iter().collect();
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("p1", 1.0, 1.0, &[Signal::ExactName]),
                candidate("p2", 0.80, 0.80, &[]),
            ],
            Some(&claimed),
        );
        assert_eq!(result.matched_reference_id.as_deref(), Some("p2"));
        assert_eq!(result.tier, MatchTier::Medium);
        assert!(result.reason.ends_with(REASON_NEXT_UNCLAIMED));
    }

    #[test]
    fn test_all_claimed() {
        let claimed: ClaimedSet = ["p1", "p2"].into_iter().collect();
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("p1", 1.0, 1.0, &[Signal::ExactName]),
                candidate("p2", 0.80, 0.80, &[]),
                candidate("p3", 0.60, 0.60, &[]),
            ],
            Some(&claimed),
        );
        assert_eq!(result.tier, MatchTier::NoMatch);
        assert_eq!(result.reason, REASON_ALL_CLAIMED);
    }

    #[test]
    fn test_below_threshold_exact_is_not_displaced() {
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("near", 0.925, 1.0, &[Signal::BirthYearExact]),
                candidate("exact", 1.0, 0.60, &[Signal::ExactName, Signal::BirthYearMismatch]),
            ],
            None,
        );
        assert_eq!(result.tier, MatchTier::NoMatch);
        assert_eq!(result.reason, REASON_BELOW_THRESHOLD);
        assert!(result.matched_reference_id.is_none());
    }

    #[test]
    fn test_next_unclaimed_must_clear_threshold() {
        let claimed: ClaimedSet = ["p1"].into_iter().collect();
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("p1", 1.0, 1.0, &[Signal::ExactName]),
                candidate("p2", 0.62, 0.62, &[]),
            ],
            Some(&claimed),
        );
        assert_eq!(result.reason, REASON_ALL_CLAIMED);

        let claimed: ClaimedSet = ["p1"].into_iter().collect();
        let result = disambiguator().resolve(
            0,
            vec![
                candidate("p1", 1.0, 0.60, &[Signal::ExactName]),
                candidate("p2", 0.62, 0.62, &[]),
            ],
            Some(&claimed),
        );
        assert_eq!(result.reason, REASON_BELOW_THRESHOLD);
    }

    #[test]
    fn test_claimed_set_ops() {
        let mut set = ClaimedSet::new();
        assert!(set.claim("p1"));
        assert!(!set.claim("p1"));
        let other: ClaimedSet = ["p2"].into_iter().collect();
        set.merge(other);
        assert_eq!(set.len(), 2);
        assert!(set.contains("p2"));
    }
}
