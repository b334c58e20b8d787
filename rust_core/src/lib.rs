//! Roster Match Core - player entity resolution.
//!
//! This crate provides:
//! - Name normalization ("LAST, FIRST", suffixes, punctuation)
//! - Bidirectional nickname expansion for given names
//! - Surname blocking with fuzzy key expansion
//! - Weighted name similarity with birth-year, team and position signals
//! - Confidence tiers, near-tie detection and one-to-one assignment
//! - Sequential, prioritized and rayon-parallel batch matching

pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod utils;

pub use config::MatcherConfig;
pub use error::{MatchError, Result};
pub use matching::{BatchMatcher, BatchOutput, ClaimedSet};
pub use models::{
    BatchSummary, CandidateScore, MatchResult, MatchTier, Position, QueryRecord, ReferenceRecord,
    RosterRow, Signal,
};
