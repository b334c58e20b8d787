mod config;

use crate::config::Config;
use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use roster_match_core::matching::{NicknameTable, TeamAliases};
use roster_match_core::{
    BatchMatcher, BatchOutput, BatchSummary, MatchResult, MatcherConfig, QueryRecord,
    ReferenceRecord, RosterRow,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Report<'a> {
    config: &'a MatcherConfig,
    summary: &'a BatchSummary,
    results: &'a [MatchResult],
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {} in {}", what, path.display()))
}

fn read_text(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {} from {}", what, path.display()))
}

fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env_and_args(&args);

    let Some(queries_path) = config.queries_path.as_deref() else {
        bail!("No query file given (argument 1 or ROSTER_MATCH_QUERIES)");
    };
    let Some(reference_path) = config.reference_path.as_deref() else {
        bail!("No reference file given (argument 2 or ROSTER_MATCH_REFERENCE)");
    };

    let match_config = MatcherConfig::from_env();
    match_config.validate().context("Invalid matcher configuration")?;

    let rows: Vec<RosterRow> = read_json(queries_path, "query rows")?;
    let population: Vec<ReferenceRecord> = read_json(reference_path, "reference population")?;
    info!(
        "Loaded {} query rows and {} reference records",
        rows.len(),
        population.len()
    );

    let nicknames = match config.nicknames_path.as_deref() {
        Some(path) => NicknameTable::from_json(&read_text(path, "nickname table")?)
            .context("Invalid nickname table")?,
        None => NicknameTable::builtin(),
    };
    let teams = match config.team_aliases_path.as_deref() {
        Some(path) => TeamAliases::from_json(&read_text(path, "team alias table")?)
            .context("Invalid team alias table")?,
        None => TeamAliases::builtin(),
    };

    let matcher = BatchMatcher::with_tables(population, match_config, nicknames, teams)
        .context("Failed to build matcher")?;

    let output = run(&matcher, &rows, config.parallel);
    log_summary(&output.summary);

    let report = Report {
        config: matcher.config(),
        summary: &output.summary,
        results: &output.results,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize results")?;

    match config.output_path.as_deref() {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            info!("Wrote {} results to {}", output.results.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Rows carrying a priority go through the prioritized path so the
/// higher-value row wins contested references.
fn run(matcher: &BatchMatcher, rows: &[RosterRow], parallel: bool) -> BatchOutput {
    if rows.iter().any(|r| r.priority.is_some()) {
        let queries: Vec<(QueryRecord, f64)> = rows
            .iter()
            .map(|r| (QueryRecord::from_roster_row(r), r.priority.unwrap_or(0.0)))
            .collect();
        if parallel && !matcher.config().one_to_one_assignment {
            warn!("Rows carry priorities; ignoring ROSTER_MATCH_PARALLEL");
        }
        return matcher.match_prioritized(&queries);
    }

    let queries: Vec<QueryRecord> = rows.iter().map(QueryRecord::from_roster_row).collect();
    if parallel {
        matcher.match_batch_parallel(&queries)
    } else {
        matcher.match_batch(&queries)
    }
}

fn log_summary(summary: &BatchSummary) {
    info!(
        "Matched {}/{} ({:.1}%): HIGH={} MEDIUM={} LOW={} ambiguous={} invalid={}",
        summary.matched,
        summary.total,
        summary.match_rate(),
        summary.high,
        summary.medium,
        summary.low,
        summary.ambiguous,
        summary.invalid
    );

    for (team, counts) in &summary.per_team {
        info!(
            "  {:<30} {:>3}/{:<3} ({:.0}%)",
            team,
            counts.matched,
            counts.total,
            counts.match_rate()
        );
    }
}
