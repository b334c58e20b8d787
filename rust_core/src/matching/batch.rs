//! Batch driver: runs every query through blocking, scoring and
//! disambiguation against one reference population.

use super::blocking::BlockingIndex;
use super::disambiguate::{ClaimedSet, Disambiguator};
use super::nickname::NicknameTable;
use super::scorer::{PreparedQuery, SimilarityScorer};
use super::team::TeamAliases;
use crate::config::MatcherConfig;
use crate::error::{MatchError, Result};
use crate::models::{
    BatchSummary, CandidateScore, MatchResult, QueryRecord, ReferenceRecord, REASON_INVALID_QUERY,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Everything one batch run produces
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// One result per query, ordered by `query_index`
    pub results: Vec<MatchResult>,
    pub summary: BatchSummary,
    /// Reference ids assigned during the run (empty unless one-to-one)
    pub claimed: ClaimedSet,
}

/// Matching engine bound to one reference population
#[derive(Debug, Clone)]
pub struct BatchMatcher {
    scorer: SimilarityScorer,
    disambiguator: Disambiguator,
    index: BlockingIndex,
}

impl BatchMatcher {
    /// Build with the built-in nickname and team alias tables.
    pub fn new(population: Vec<ReferenceRecord>, config: MatcherConfig) -> Result<Self> {
        Self::with_tables(
            population,
            config,
            NicknameTable::builtin(),
            TeamAliases::builtin(),
        )
    }

    /// Build with caller-supplied lookup tables.
    ///
    /// Fails fast on an empty population or an invalid configuration.
    pub fn with_tables(
        population: Vec<ReferenceRecord>,
        config: MatcherConfig,
        nicknames: NicknameTable,
        teams: TeamAliases,
    ) -> Result<Self> {
        config.validate()?;
        if population.is_empty() {
            return Err(MatchError::EmptyReferencePopulation);
        }

        let index = BlockingIndex::build(population, &config);
        info!(
            "Matcher ready: {} reference records in {} blocks, {} nickname entries",
            index.len(),
            index.bucket_count(),
            nicknames.len()
        );

        Ok(Self {
            disambiguator: Disambiguator::new(&config),
            scorer: SimilarityScorer::new(config, nicknames, teams),
            index,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        self.scorer.config()
    }

    pub fn index(&self) -> &BlockingIndex {
        &self.index
    }

    /// Match a single query. `claimed` is consulted only when given.
    pub fn match_one(
        &self,
        query_index: usize,
        query: &QueryRecord,
        claimed: Option<&ClaimedSet>,
    ) -> MatchResult {
        let prepared = match self.scorer.prepare(query_index, query) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("{}", e);
                return MatchResult::no_match(query_index, REASON_INVALID_QUERY);
            }
        };

        let candidates = self.score_candidates(&prepared);
        let result = self.disambiguator.resolve(query_index, candidates, claimed);
        debug!(
            "Query {} '{}' -> {:?} [{}] {}",
            query_index, prepared.name, result.matched_reference_id, result.tier, result.reason
        );
        result
    }

    fn score_candidates(&self, query: &PreparedQuery) -> Vec<CandidateScore> {
        let mut block = self.index.candidates(&query.block_key);

        if block.is_empty() {
            let limit = self.config().fallback_scan_limit;
            if limit == 0 {
                return Vec::new();
            }
            debug!(
                "No block for '{}' (query {}), scanning up to {} records",
                query.block_key, query.query_index, limit
            );
            block = self.index.fallback_sample(limit);
        }

        block
            .into_iter()
            .filter_map(|candidate| self.scorer.score_prepared(query, candidate))
            .collect()
    }

    /// Match queries in input order.
    pub fn match_batch(&self, queries: &[QueryRecord]) -> BatchOutput {
        self.match_batch_with_claims(queries, ClaimedSet::new())
    }

    /// Match queries in input order, starting from claims made by an earlier
    /// run (e.g. a previous roster already assigned against the same store).
    pub fn match_batch_with_claims(
        &self,
        queries: &[QueryRecord],
        claimed: ClaimedSet,
    ) -> BatchOutput {
        let records: Vec<&QueryRecord> = queries.iter().collect();
        let order: Vec<usize> = (0..records.len()).collect();
        self.run_ordered(&records, &order, claimed)
    }

    /// Match `(query, priority)` pairs, highest priority first, so in
    /// one-to-one mode the higher-value row wins a contested reference.
    /// Equal priorities keep input order. Results come back in input order.
    pub fn match_prioritized(&self, queries: &[(QueryRecord, f64)]) -> BatchOutput {
        let records: Vec<&QueryRecord> = queries.iter().map(|(q, _)| q).collect();

        let priority = |i: usize| {
            let p = queries[i].1;
            if p.is_nan() {
                f64::NEG_INFINITY
            } else {
                p
            }
        };
        let mut order: Vec<usize> = (0..queries.len()).collect();
        order.sort_by(|&a, &b| priority(b).total_cmp(&priority(a)));

        self.run_ordered(&records, &order, ClaimedSet::new())
    }

    /// Score queries across the rayon pool. One-to-one assignment depends on
    /// processing order, so with it enabled this falls back to `match_batch`.
    pub fn match_batch_parallel(&self, queries: &[QueryRecord]) -> BatchOutput {
        if self.config().one_to_one_assignment {
            debug!("One-to-one assignment enabled, matching sequentially");
            return self.match_batch(queries);
        }

        info!(
            "Matching {} queries in parallel against {} reference records",
            queries.len(),
            self.index.len()
        );

        let results: Vec<MatchResult> = queries
            .par_iter()
            .enumerate()
            .map(|(i, query)| self.match_one(i, query, None))
            .collect();

        self.finish(queries.iter(), results, ClaimedSet::new())
    }

    fn run_ordered(
        &self,
        queries: &[&QueryRecord],
        order: &[usize],
        mut claimed: ClaimedSet,
    ) -> BatchOutput {
        let one_to_one = self.config().one_to_one_assignment;
        info!(
            "Matching {} queries against {} reference records (one-to-one: {})",
            queries.len(),
            self.index.len(),
            one_to_one
        );

        let mut results = Vec::with_capacity(queries.len());
        for &i in order {
            let result = self.match_one(i, queries[i], one_to_one.then_some(&claimed));
            if one_to_one {
                if let Some(id) = &result.matched_reference_id {
                    claimed.claim(id);
                }
            }
            results.push(result);
        }
        results.sort_by_key(|r| r.query_index);

        self.finish(queries.iter().copied(), results, claimed)
    }

    fn finish<'a>(
        &self,
        queries: impl Iterator<Item = &'a QueryRecord>,
        results: Vec<MatchResult>,
        claimed: ClaimedSet,
    ) -> BatchOutput {
        let mut summary = BatchSummary::default();
        for (query, result) in queries.zip(&results) {
            let team = query
                .team_hint
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty());
            summary.record(result, team);
        }

        info!(
            "Batch complete: {}/{} matched ({:.1}%), high={} medium={} low={} ambiguous={} invalid={}",
            summary.matched,
            summary.total,
            summary.match_rate(),
            summary.high,
            summary.medium,
            summary.low,
            summary.ambiguous,
            summary.invalid
        );

        BatchOutput {
            results,
            summary,
            claimed,
        }
    }
}
