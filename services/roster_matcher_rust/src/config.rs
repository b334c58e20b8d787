use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub queries_path: Option<PathBuf>,
    pub reference_path: Option<PathBuf>,
    /// None writes results to stdout
    pub output_path: Option<PathBuf>,
    pub nicknames_path: Option<PathBuf>,
    pub team_aliases_path: Option<PathBuf>,
    pub parallel: bool,
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

impl Config {
    /// Environment first, positional arguments (queries, reference, output) override.
    pub fn from_env_and_args(args: &[String]) -> Self {
        let arg = |i: usize| args.get(i).map(PathBuf::from);

        Self {
            queries_path: arg(0).or_else(|| env_path("ROSTER_MATCH_QUERIES")),
            reference_path: arg(1).or_else(|| env_path("ROSTER_MATCH_REFERENCE")),
            output_path: arg(2).or_else(|| env_path("ROSTER_MATCH_OUTPUT")),
            nicknames_path: env_path("ROSTER_MATCH_NICKNAMES"),
            team_aliases_path: env_path("ROSTER_MATCH_TEAM_ALIASES"),
            parallel: env::var("ROSTER_MATCH_PARALLEL")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false),
        }
    }
}
