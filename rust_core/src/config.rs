//! Matcher configuration.
//!
//! Every threshold the matching pipeline uses is a named field here so a
//! deployment can tune it without touching code. Values come from `MATCH_*`
//! environment variables with the defaults below as fallback.

use crate::error::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Matching engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum surname similarity; below this a candidate is rejected outright
    pub surname_threshold: f64,
    /// Minimum given-name similarity when both sides carry a given name
    pub given_name_threshold: f64,
    /// Minimum raw name similarity before any bonus is considered
    pub acceptance_floor: f64,
    /// Minimum adjusted score for a match (also the LOW tier floor)
    pub acceptance_threshold: f64,
    /// Adjusted score at or above which a match is HIGH
    pub high_tier: f64,
    /// Adjusted score at or above which a match is MEDIUM
    pub medium_tier: f64,
    /// Surname share of the raw score; given name gets the remainder
    pub surname_weight: f64,
    /// Birth-year difference (years) beyond which a penalty applies
    pub birth_year_tolerance: u32,
    pub birth_year_exact_bonus: f64,
    pub birth_year_near_bonus: f64,
    pub birth_year_penalty: f64,
    /// Scale applied to team similarity before adding it
    pub team_weight: f64,
    /// Team similarity must exceed this to count at all
    pub team_min_similarity: f64,
    pub position_exact_bonus: f64,
    /// Bonus when both positions are (different) forward subtypes
    pub position_forward_bonus: f64,
    /// Runner-up within this fraction of the best score is a near-tie
    pub ambiguity_margin: f64,
    /// Confidence multiplier applied to near-ties
    pub ambiguity_damping: f64,
    /// Each reference record may be claimed by at most one query
    pub one_to_one_assignment: bool,
    /// Minimum block-key similarity for fuzzy block expansion
    pub block_fuzzy_tolerance: f64,
    /// Exact buckets at or below this size are widened with fuzzy keys
    pub small_block_size: usize,
    /// Records scanned when blocking finds nothing (0 disables the scan)
    pub fallback_scan_limit: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            surname_threshold: 0.65,
            given_name_threshold: 0.50,
            acceptance_floor: 0.60,
            acceptance_threshold: 0.65,
            high_tier: 0.85,
            medium_tier: 0.75,
            surname_weight: 0.60,
            birth_year_tolerance: 2,
            birth_year_exact_bonus: 0.10,
            birth_year_near_bonus: 0.05,
            birth_year_penalty: 0.15,
            team_weight: 0.10,
            team_min_similarity: 0.50,
            position_exact_bonus: 0.03,
            position_forward_bonus: 0.02,
            ambiguity_margin: 0.85,
            ambiguity_damping: 0.80,
            one_to_one_assignment: false,
            block_fuzzy_tolerance: 0.60,
            small_block_size: 3,
            fallback_scan_limit: 500,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(MatchError::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

impl MatcherConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            surname_threshold: env_or("MATCH_SURNAME_THRESHOLD", d.surname_threshold),
            given_name_threshold: env_or("MATCH_GIVEN_NAME_THRESHOLD", d.given_name_threshold),
            acceptance_floor: env_or("MATCH_ACCEPTANCE_FLOOR", d.acceptance_floor),
            acceptance_threshold: env_or("MATCH_ACCEPTANCE_THRESHOLD", d.acceptance_threshold),
            high_tier: env_or("MATCH_HIGH_TIER", d.high_tier),
            medium_tier: env_or("MATCH_MEDIUM_TIER", d.medium_tier),
            surname_weight: env_or("MATCH_SURNAME_WEIGHT", d.surname_weight),
            birth_year_tolerance: env_or("MATCH_BIRTH_YEAR_TOLERANCE", d.birth_year_tolerance),
            birth_year_exact_bonus: env_or(
                "MATCH_BIRTH_YEAR_EXACT_BONUS",
                d.birth_year_exact_bonus,
            ),
            birth_year_near_bonus: env_or("MATCH_BIRTH_YEAR_NEAR_BONUS", d.birth_year_near_bonus),
            birth_year_penalty: env_or("MATCH_BIRTH_YEAR_PENALTY", d.birth_year_penalty),
            team_weight: env_or("MATCH_TEAM_WEIGHT", d.team_weight),
            team_min_similarity: env_or("MATCH_TEAM_MIN_SIMILARITY", d.team_min_similarity),
            position_exact_bonus: env_or("MATCH_POSITION_EXACT_BONUS", d.position_exact_bonus),
            position_forward_bonus: env_or(
                "MATCH_POSITION_FORWARD_BONUS",
                d.position_forward_bonus,
            ),
            ambiguity_margin: env_or("MATCH_AMBIGUITY_MARGIN", d.ambiguity_margin),
            ambiguity_damping: env_or("MATCH_AMBIGUITY_DAMPING", d.ambiguity_damping),
            one_to_one_assignment: env::var("MATCH_ONE_TO_ONE")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(d.one_to_one_assignment),
            block_fuzzy_tolerance: env_or("MATCH_BLOCK_FUZZY_TOLERANCE", d.block_fuzzy_tolerance),
            small_block_size: env_or("MATCH_SMALL_BLOCK_SIZE", d.small_block_size),
            fallback_scan_limit: env_or("MATCH_FALLBACK_SCAN_LIMIT", d.fallback_scan_limit),
        }
    }

    /// Builder-style toggle for one-to-one assignment
    pub fn with_one_to_one(mut self, enabled: bool) -> Self {
        self.one_to_one_assignment = enabled;
        self
    }

    pub fn with_acceptance_floor(mut self, floor: f64) -> Self {
        self.acceptance_floor = floor;
        self
    }

    /// Given-name share of the raw score
    pub fn given_name_weight(&self) -> f64 {
        1.0 - self.surname_weight
    }

    /// Reject configurations that would make tiers or scores meaningless.
    pub fn validate(&self) -> Result<()> {
        check_unit("surname_threshold", self.surname_threshold)?;
        check_unit("given_name_threshold", self.given_name_threshold)?;
        check_unit("acceptance_floor", self.acceptance_floor)?;
        check_unit("acceptance_threshold", self.acceptance_threshold)?;
        check_unit("high_tier", self.high_tier)?;
        check_unit("medium_tier", self.medium_tier)?;
        check_unit("surname_weight", self.surname_weight)?;
        check_unit("team_weight", self.team_weight)?;
        check_unit("team_min_similarity", self.team_min_similarity)?;
        check_unit("block_fuzzy_tolerance", self.block_fuzzy_tolerance)?;

        for (name, value) in [
            ("birth_year_exact_bonus", self.birth_year_exact_bonus),
            ("birth_year_near_bonus", self.birth_year_near_bonus),
            ("birth_year_penalty", self.birth_year_penalty),
            ("position_exact_bonus", self.position_exact_bonus),
            ("position_forward_bonus", self.position_forward_bonus),
        ] {
            check_unit(name, value)?;
        }

        if !(self.ambiguity_margin > 0.0 && self.ambiguity_margin <= 1.0) {
            return Err(MatchError::InvalidConfig(format!(
                "ambiguity_margin must be within (0, 1], got {}",
                self.ambiguity_margin
            )));
        }
        if !(self.ambiguity_damping > 0.0 && self.ambiguity_damping <= 1.0) {
            return Err(MatchError::InvalidConfig(format!(
                "ambiguity_damping must be within (0, 1], got {}",
                self.ambiguity_damping
            )));
        }
        if self.medium_tier > self.high_tier {
            return Err(MatchError::InvalidConfig(format!(
                "medium_tier ({}) is above high_tier ({})",
                self.medium_tier, self.high_tier
            )));
        }
        if self.acceptance_threshold > self.medium_tier {
            return Err(MatchError::InvalidConfig(format!(
                "acceptance_threshold ({}) is above medium_tier ({})",
                self.acceptance_threshold, self.medium_tier
            )));
        }

        Ok(())
    }
}
