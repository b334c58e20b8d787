//! Matcher error types

use thiserror::Error;

/// Errors produced by the matching engine.
///
/// Only `EmptyReferencePopulation` and `InvalidConfig` ever escape to the
/// caller. `InvalidQueryRecord` is raised internally per record and turned
/// into a `NO_MATCH` result so one bad row never aborts a batch.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid query record at index {index}: {reason}")]
    InvalidQueryRecord { index: usize, reason: String },

    #[error("Reference population is empty, nothing to match against")]
    EmptyReferencePopulation,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Table parse error: {0}")]
    TableParse(#[from] serde_json::Error),
}

impl MatchError {
    /// Check if the error only affects a single record and the batch can go on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MatchError::InvalidQueryRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
