// Shared models for the roster matching engine
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::utils::birth_year::{birth_year_from_dob, birth_year_from_grad_year};

// ============================================================================
// Position
// ============================================================================

/// Hockey position as it appears on rosters and in the reference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    Forward,
    Center,
    LeftWing,
    RightWing,
    Defense,
    Goalie,
    #[default]
    Unknown,
}

impl Position {
    /// Parse a roster position string; anything unrecognized is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let p: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match p.as_str() {
            "f" | "fwd" | "forward" | "w" | "wing" | "winger" => Position::Forward,
            "c" | "center" | "centre" => Position::Center,
            "lw" | "leftwing" => Position::LeftWing,
            "rw" | "rightwing" => Position::RightWing,
            "d" | "ld" | "rd" | "def" | "defense" | "defence" | "defenseman" | "defenceman" => {
                Position::Defense
            }
            "g" | "goalie" | "goaltender" | "goalkeeper" => Position::Goalie,
            _ => Position::Unknown,
        }
    }

    /// Forward subtypes are used interchangeably across sources
    pub fn is_forward(&self) -> bool {
        matches!(
            self,
            Position::Forward | Position::Center | Position::LeftWing | Position::RightWing
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Position::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Forward => "F",
            Position::Center => "C",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Defense => "D",
            Position::Goalie => "G",
            Position::Unknown => "",
        }
    }
}

impl From<String> for Position {
    fn from(raw: String) -> Self {
        Position::parse(&raw)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.as_str().to_string()
    }
}

// ============================================================================
// Input Records
// ============================================================================

/// A noisy player reference from a roster scrape, draft list or scouting report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub display_name: String,
    #[serde(default)]
    pub team_hint: Option<String>,
    #[serde(default)]
    pub position_hint: Position,
    #[serde(default)]
    pub birth_year_hint: Option<i32>,
}

impl QueryRecord {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            team_hint: None,
            position_hint: Position::Unknown,
            birth_year_hint: None,
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team_hint = Some(team.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position_hint = position;
        self
    }

    pub fn with_birth_year(mut self, year: i32) -> Self {
        self.birth_year_hint = Some(year);
        self
    }

    /// Derive the birth year from a graduation year. Out-of-range graduation
    /// years leave the hint unset rather than guessing.
    pub fn with_grad_year(mut self, grad_year: i32) -> Self {
        self.birth_year_hint = birth_year_from_grad_year(grad_year);
        self
    }

    /// Build a query from a loader row. Birth year precedence: explicit
    /// birth year, then date of birth, then graduation year.
    pub fn from_roster_row(row: &RosterRow) -> Self {
        let birth_year_hint = row
            .birth_year
            .or_else(|| row.dob.as_deref().and_then(birth_year_from_dob))
            .or_else(|| row.grad_year.and_then(birth_year_from_grad_year));

        Self {
            display_name: row.name.clone(),
            team_hint: row
                .team
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            position_hint: row
                .position
                .as_deref()
                .map(Position::parse)
                .unwrap_or_default(),
            birth_year_hint,
        }
    }
}

/// Raw row shape produced by the roster/draft loaders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterRow {
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub grad_year: Option<i32>,
    /// Ordering signal for one-to-one assignment (e.g. total points)
    #[serde(default)]
    pub priority: Option<f64>,
}

/// A canonical player record from the reference population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub reference_id: String,
    pub full_name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub current_team: Option<String>,
}

impl ReferenceRecord {
    pub fn new(reference_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            reference_id: reference_id.into(),
            full_name: full_name.into(),
            birth_year: None,
            position: None,
            current_team: None,
        }
    }

    pub fn with_birth_year(mut self, year: i32) -> Self {
        self.birth_year = Some(year);
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.current_team = Some(team.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Signals that contributed to a candidate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ExactName,
    Nickname,
    BirthYearExact,
    BirthYearNear,
    BirthYearMismatch,
    Team,
    PositionExact,
    PositionForward,
}

impl Signal {
    pub fn tag(&self) -> &'static str {
        match self {
            Signal::ExactName => "exact_name",
            Signal::Nickname => "nickname",
            Signal::BirthYearExact => "birth_year_exact",
            Signal::BirthYearNear => "birth_year_near",
            Signal::BirthYearMismatch => "birth_year_mismatch",
            Signal::Team => "team",
            Signal::PositionExact => "position_exact",
            Signal::PositionForward => "position_forward",
        }
    }

    pub fn is_birth_year(&self) -> bool {
        matches!(
            self,
            Signal::BirthYearExact | Signal::BirthYearNear | Signal::BirthYearMismatch
        )
    }
}

/// Score of one reference record against one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub reference_id: String,
    /// Weighted surname + given-name similarity (0-1)
    pub raw_similarity: f64,
    /// Raw similarity after bonuses and penalties, clamped to 0-1
    pub adjusted_score: f64,
    pub signals_used: BTreeSet<Signal>,
}

impl CandidateScore {
    /// Score for a candidate that was rejected before any signal fired
    pub fn rejected(reference_id: impl Into<String>) -> Self {
        Self {
            reference_id: reference_id.into(),
            raw_similarity: 0.0,
            adjusted_score: 0.0,
            signals_used: BTreeSet::new(),
        }
    }

    pub fn is_exact_name(&self) -> bool {
        self.signals_used.contains(&Signal::ExactName)
    }

    pub fn has_birth_year_signal(&self) -> bool {
        self.signals_used.iter().any(Signal::is_birth_year)
    }
}

// ============================================================================
// Match Results
// ============================================================================

/// Discretized confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    NoMatch,
    Low,
    Medium,
    High,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::NoMatch => "NO_MATCH",
            MatchTier::Low => "LOW",
            MatchTier::Medium => "MEDIUM",
            MatchTier::High => "HIGH",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final, immutable outcome for one query record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position of the query in the caller's input
    pub query_index: usize,
    pub matched_reference_id: Option<String>,
    pub confidence: Option<f64>,
    pub tier: MatchTier,
    pub reason: String,
}

impl MatchResult {
    pub fn no_match(query_index: usize, reason: &str) -> Self {
        Self {
            query_index,
            matched_reference_id: None,
            confidence: None,
            tier: MatchTier::NoMatch,
            reason: reason.to_string(),
        }
    }

    pub fn matched(
        query_index: usize,
        reference_id: String,
        confidence: f64,
        tier: MatchTier,
        reason: String,
    ) -> Self {
        Self {
            query_index,
            matched_reference_id: Some(reference_id),
            confidence: Some(confidence),
            tier,
            reason,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched_reference_id.is_some()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.reason.split('+').any(|tag| tag == REASON_AMBIGUOUS)
    }
}

pub const REASON_AMBIGUOUS: &str = "ambiguous";
pub const REASON_NEXT_UNCLAIMED: &str = "next_unclaimed";
pub const REASON_NO_CANDIDATES: &str = "no_candidates";
pub const REASON_BELOW_THRESHOLD: &str = "below_threshold";
pub const REASON_ALL_CLAIMED: &str = "all_candidates_claimed";
pub const REASON_INVALID_QUERY: &str = "invalid_query";

// ============================================================================
// Batch Summary
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub total: usize,
    pub matched: usize,
}

impl TeamSummary {
    /// Matched share in percent
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64 * 100.0
        }
    }
}

/// Counters accumulated over one batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub ambiguous: usize,
    pub invalid: usize,
    /// Keyed by the query's team hint as given
    pub per_team: BTreeMap<String, TeamSummary>,
}

impl BatchSummary {
    pub fn record(&mut self, result: &MatchResult, team_hint: Option<&str>) {
        self.total += 1;
        match result.tier {
            MatchTier::High => self.high += 1,
            MatchTier::Medium => self.medium += 1,
            MatchTier::Low => self.low += 1,
            MatchTier::NoMatch => {}
        }
        if result.is_match() {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
        if result.is_ambiguous() {
            self.ambiguous += 1;
        }
        if result.reason == REASON_INVALID_QUERY {
            self.invalid += 1;
        }

        if let Some(team) = team_hint {
            let entry = self.per_team.entry(team.to_string()).or_default();
            entry.total += 1;
            if result.is_match() {
                entry.matched += 1;
            }
        }
    }

    /// Overall matched share in percent
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parse() {
        assert_eq!(Position::parse("LW"), Position::LeftWing);
        assert_eq!(Position::parse(" rd "), Position::Defense);
        assert_eq!(Position::parse("Goalie"), Position::Goalie);
        assert_eq!(Position::parse("F"), Position::Forward);
        assert_eq!(Position::parse("??"), Position::Unknown);
        assert!(Position::Center.is_forward());
        assert!(!Position::Defense.is_forward());
    }

    #[test]
    fn test_position_serde_uses_roster_codes() {
        let json = serde_json::to_string(&Position::RightWing).unwrap();
        assert_eq!(json, "\"RW\"");
        let back: Position = serde_json::from_str("\"defense\"").unwrap();
        assert_eq!(back, Position::Defense);
    }

    #[test]
    fn test_tier_serializes_screaming_case() {
        let json = serde_json::to_string(&MatchTier::NoMatch).unwrap();
        assert_eq!(json, "\"NO_MATCH\"");
        assert!(MatchTier::High > MatchTier::Medium);
        assert!(MatchTier::Low > MatchTier::NoMatch);
    }

    #[test]
    fn test_query_from_roster_row_birth_year_precedence() {
        let row = RosterRow {
            name: "Will Smith".to_string(),
            team: Some("  Avon Old Farms ".to_string()),
            position: Some("C".to_string()),
            dob: Some("20-Dec-2007".to_string()),
            grad_year: Some(2026),
            ..Default::default()
        };
        let query = QueryRecord::from_roster_row(&row);
        assert_eq!(query.birth_year_hint, Some(2007));
        assert_eq!(query.team_hint.as_deref(), Some("Avon Old Farms"));
        assert_eq!(query.position_hint, Position::Center);

        let grad_only = RosterRow {
            name: "Will Smith".to_string(),
            grad_year: Some(2026),
            team: Some("   ".to_string()),
            ..Default::default()
        };
        let query = QueryRecord::from_roster_row(&grad_only);
        assert_eq!(query.birth_year_hint, Some(2008));
        assert_eq!(query.team_hint, None);
    }

    #[test]
    fn test_with_grad_year_out_of_range_is_unset() {
        let query = QueryRecord::new("Jack Hughes").with_grad_year(1999);
        assert_eq!(query.birth_year_hint, None);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::default();
        summary.record(
            &MatchResult::matched(0, "p1".into(), 0.9, MatchTier::High, "exact_name".into()),
            Some("Avon"),
        );
        summary.record(
            &MatchResult::matched(
                1,
                "p2".into(),
                0.64,
                MatchTier::Medium,
                "fuzzy_name+ambiguous".into(),
            ),
            Some("Avon"),
        );
        summary.record(&MatchResult::no_match(2, REASON_INVALID_QUERY), None);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.ambiguous, 1);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.per_team["Avon"].total, 2);
        assert_eq!(summary.per_team["Avon"].match_rate(), 100.0);
    }
}
