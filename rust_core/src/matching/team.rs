//! Team name canonicalization for the team-affinity signal.
//!
//! Roster scrapes and the reference store spell schools differently
//! ("Saint Mark's" vs "St. Marks School"). Both sides go through the alias
//! table before their similarity is measured.

use crate::error::Result;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use strsim::normalized_levenshtein;

/// Format: canonical_name -> [aliases]
const DEFAULT_TEAM_ALIASES: &[(&str, &[&str])] = &[
    ("st marks", &["st mark's", "saint marks", "saint mark's"]),
    ("st georges", &["st george's", "saint georges", "saint george's"]),
    ("st pauls", &["st paul's", "saint paul's", "saint pauls", "st paul's school"]),
    ("noble & greenough", &["nobles", "noble and greenough", "noble greenough"]),
    ("bb&n", &["buckingham browne & nichols", "buckingham browne nichols"]),
    ("nmh", &["northfield mount hermon", "northfield-mount hermon"]),
    ("kua", &["kimball union", "kimball union academy"]),
    ("governors", &["governor's", "governor's academy", "the governor's academy"]),
    ("milton", &["milton academy"]),
    ("belmont hill", &["belmont hill school"]),
    ("rivers", &["rivers school", "the rivers school"]),
    ("thayer", &["thayer academy"]),
    ("lawrence", &["lawrence academy"]),
    ("tabor", &["tabor academy"]),
    ("brooks", &["brooks school"]),
    ("middlesex", &["middlesex school"]),
    ("groton", &["groton school"]),
    ("avon old farms", &["avon", "aof"]),
];

/// Trailing words that carry no identity ("Tabor Academy" == "Tabor")
const GENERIC_TEAM_WORDS: &[&str] = &["school", "academy", "prep", "hockey"];

/// Lowercase, drop periods/apostrophes, turn hyphens into spaces, collapse whitespace.
pub fn normalize_team(team: &str) -> String {
    team.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '\'' | '\u{2019}'))
        .map(|c| if c == '-' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_generic_suffix(team: &str) -> &str {
    let mut current = team;
    while let Some((head, last)) = current.rsplit_once(' ') {
        if GENERIC_TEAM_WORDS.contains(&last) {
            current = head;
        } else {
            break;
        }
    }
    current
}

/// Alias table mapping team spellings onto one canonical form
#[derive(Debug, Clone, Default)]
pub struct TeamAliases {
    /// normalized alias -> canonical
    aliases: FxHashMap<String, String>,
}

impl TeamAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in prep-school aliases.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (canonical, aliases) in DEFAULT_TEAM_ALIASES {
            for alias in *aliases {
                table.insert(canonical, alias);
            }
        }
        table
    }

    /// Load from JSON: `{ "nmh": ["northfield mount hermon"], ... }`
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (canonical, aliases) in &raw {
            for alias in aliases {
                table.insert(canonical, alias);
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, canonical: &str, alias: &str) {
        let canonical = normalize_team(canonical);
        let alias = normalize_team(alias);
        if canonical.is_empty() || alias.is_empty() {
            return;
        }
        self.aliases.insert(canonical.clone(), canonical.clone());
        self.aliases.insert(alias, canonical);
    }

    /// Canonical form of a team name; unknown teams come back normalized.
    pub fn canonicalize(&self, team: &str) -> String {
        let normalized = normalize_team(team);
        if let Some(canonical) = self.aliases.get(&normalized) {
            return canonical.clone();
        }

        let stripped = strip_generic_suffix(&normalized);
        if let Some(canonical) = self.aliases.get(stripped) {
            return canonical.clone();
        }
        stripped.to_string()
    }

    /// Similarity (0-1) of two team names after canonicalization.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = self.canonicalize(a);
        let b = self.canonicalize(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        normalized_levenshtein(&a, &b)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
