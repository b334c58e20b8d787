//! Composite similarity scoring of one query against one candidate.
//!
//! Scoring order:
//! 1. Surname guard: surname similarity below `surname_threshold` rejects the
//!    candidate before anything else is looked at.
//!    A surname-only name is compared only against other surname-only names.
//! 2. Given name: best similarity over every nickname variant of the query's
//!    first token, so "will" vs "william" scores 1.0. Below
//!    `given_name_threshold` the candidate is rejected (siblings share a
//!    surname, birth year and team).
//! 3. Raw similarity = weighted surname + given name.
//! 4. Acceptance floor: raw similarity below `acceptance_floor` is dropped
//!    before bonuses, so birth year and team can never rescue a different name.
//! 5. Secondary signals (birth year, team, position) adjust the raw score.

use super::blocking::{block_key, IndexedRecord};
use super::nickname::NicknameTable;
use super::normalize::{normalize, NormalizedName};
use super::similarity;
use super::team::TeamAliases;
use crate::config::MatcherConfig;
use crate::error::{MatchError, Result};
use crate::models::{CandidateScore, Position, QueryRecord, ReferenceRecord, Signal};
use std::collections::BTreeSet;

/// Query with everything the scorer derives from it computed once
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub query_index: usize,
    pub name: NormalizedName,
    pub block_key: String,
    /// Nickname variants of the given name; empty for single-token names
    pub given_variants: BTreeSet<String>,
    pub team_hint: Option<String>,
    pub position_hint: Position,
    pub birth_year_hint: Option<i32>,
}

/// Scores candidates using the configured weights and injected tables
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    config: MatcherConfig,
    nicknames: NicknameTable,
    teams: TeamAliases,
}

impl SimilarityScorer {
    pub fn new(config: MatcherConfig, nicknames: NicknameTable, teams: TeamAliases) -> Self {
        Self {
            config,
            nicknames,
            teams,
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn nicknames(&self) -> &NicknameTable {
        &self.nicknames
    }

    /// Normalize and expand a query. Fails only when the name has no usable token.
    pub fn prepare(&self, query_index: usize, query: &QueryRecord) -> Result<PreparedQuery> {
        let name = normalize(&query.display_name);
        let Some(surname) = name.surname() else {
            return Err(MatchError::InvalidQueryRecord {
                index: query_index,
                reason: format!("unusable display name {:?}", query.display_name),
            });
        };
        let block_key = block_key(surname);
        let given_variants = name
            .given_name()
            .map(|given| self.nicknames.expand(given))
            .unwrap_or_default();

        Ok(PreparedQuery {
            query_index,
            block_key,
            given_variants,
            team_hint: query
                .team_hint
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            position_hint: query.position_hint,
            birth_year_hint: query.birth_year_hint,
            name,
        })
    }

    /// Score a query against a reference record.
    ///
    /// Rejected candidates (surname guard, acceptance floor, unusable names)
    /// come back with zero scores and no signals.
    pub fn score(&self, query: &QueryRecord, candidate: &ReferenceRecord) -> CandidateScore {
        let Ok(prepared) = self.prepare(0, query) else {
            return CandidateScore::rejected(candidate.reference_id.clone());
        };
        let indexed = IndexedRecord {
            name: normalize(&candidate.full_name),
            record: candidate.clone(),
        };
        self.score_prepared(&prepared, &indexed)
            .unwrap_or_else(|| CandidateScore::rejected(candidate.reference_id.clone()))
    }

    /// Score an already-prepared query against an indexed record.
    /// `None` means the candidate was rejected.
    pub fn score_prepared(
        &self,
        query: &PreparedQuery,
        candidate: &IndexedRecord,
    ) -> Option<CandidateScore> {
        let q_surname = query.name.surname()?;
        let c_surname = candidate.name.surname()?;

        let surname_sim = similarity(q_surname, c_surname);
        if surname_sim < self.config.surname_threshold {
            return None;
        }

        let mut signals = BTreeSet::new();

        let given_sim = match (query.name.given_name(), candidate.name.given_name()) {
            (Some(q_given), Some(c_given)) => {
                let best = query
                    .given_variants
                    .iter()
                    .map(|variant| similarity(variant, c_given))
                    .fold(0.0_f64, f64::max);
                if best < self.config.given_name_threshold {
                    return None;
                }
                if best >= 1.0 && q_given != c_given {
                    signals.insert(Signal::Nickname);
                }
                best
            }
            // Both single-token: nothing to compare beyond the surname
            (None, None) => 1.0,
            // Surname-only on one side: too weak to tell siblings apart
            _ => return None,
        };

        let raw = self.config.surname_weight * surname_sim
            + self.config.given_name_weight() * given_sim;

        if query.name == candidate.name {
            signals.insert(Signal::ExactName);
        }

        if raw < self.config.acceptance_floor {
            return None;
        }

        let mut adjustment = 0.0;
        adjustment += self.birth_year_adjustment(query, &candidate.record, &mut signals);
        adjustment += self.team_adjustment(query, &candidate.record, &mut signals);
        adjustment += self.position_adjustment(query, &candidate.record, &mut signals);

        Some(CandidateScore {
            reference_id: candidate.record.reference_id.clone(),
            raw_similarity: raw,
            adjusted_score: (raw + adjustment).clamp(0.0, 1.0),
            signals_used: signals,
        })
    }

    fn birth_year_adjustment(
        &self,
        query: &PreparedQuery,
        candidate: &ReferenceRecord,
        signals: &mut BTreeSet<Signal>,
    ) -> f64 {
        // Missing on either side is neutral
        let (Some(q_year), Some(c_year)) = (query.birth_year_hint, candidate.birth_year) else {
            return 0.0;
        };

        let diff = q_year.abs_diff(c_year);
        if diff == 0 {
            signals.insert(Signal::BirthYearExact);
            self.config.birth_year_exact_bonus
        } else if diff == 1 {
            signals.insert(Signal::BirthYearNear);
            self.config.birth_year_near_bonus
        } else if diff > self.config.birth_year_tolerance {
            signals.insert(Signal::BirthYearMismatch);
            -self.config.birth_year_penalty
        } else {
            0.0
        }
    }

    fn team_adjustment(
        &self,
        query: &PreparedQuery,
        candidate: &ReferenceRecord,
        signals: &mut BTreeSet<Signal>,
    ) -> f64 {
        let (Some(q_team), Some(c_team)) = (query.team_hint.as_deref(), candidate.current_team.as_deref())
        else {
            return 0.0;
        };

        let team_sim = self.teams.similarity(q_team, c_team);
        if team_sim > self.config.team_min_similarity {
            signals.insert(Signal::Team);
            self.config.team_weight * team_sim
        } else {
            0.0
        }
    }

    fn position_adjustment(
        &self,
        query: &PreparedQuery,
        candidate: &ReferenceRecord,
        signals: &mut BTreeSet<Signal>,
    ) -> f64 {
        let q_pos = query.position_hint;
        let c_pos = candidate.position.unwrap_or_default();
        if !q_pos.is_known() || !c_pos.is_known() {
            return 0.0;
        }

        if q_pos == c_pos {
            signals.insert(Signal::PositionExact);
            self.config.position_exact_bonus
        } else if q_pos.is_forward() && c_pos.is_forward() {
            signals.insert(Signal::PositionForward);
            self.config.position_forward_bonus
        } else {
            0.0
        }
    }
}
