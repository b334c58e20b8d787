//! Player name normalization.
//!
//! Every comparison in the engine runs on normalized names: lowercase,
//! letters/spaces/hyphens only, single spaces, generational suffixes dropped.
//! `normalize` never fails; garbage degrades to an empty name, and an empty
//! name never matches anything.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Generational suffixes removed from the end of a name. Periods are
/// stripped before this check, so "jr." arrives here as "jr".
const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

/// Canonical form of a player name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|t| !t.is_empty())
    }

    /// Last token
    pub fn surname(&self) -> Option<&str> {
        self.tokens().last()
    }

    /// First token, only when the name has more than one token
    pub fn given_name(&self) -> Option<&str> {
        let mut tokens = self.tokens();
        let first = tokens.next()?;
        tokens.next().map(|_| first)
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_suffix(token: &str) -> bool {
    NAME_SUFFIXES.contains(&token)
}

/// Turn "last, first" into "first last". A suffix after the comma
/// ("smith, jr.") stays at the end so it is dropped later.
fn reorder_last_first(name: &str) -> Cow<'_, str> {
    let Some((last, rest)) = name.split_once(',') else {
        return Cow::Borrowed(name);
    };
    if rest.contains(',') {
        return Cow::Borrowed(name);
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Cow::Owned(last.to_string());
    }

    let rest_letters: String = rest.chars().filter(|c| c.is_alphabetic()).collect();
    if is_suffix(&rest_letters) {
        Cow::Owned(format!("{} {}", last, rest))
    } else {
        Cow::Owned(format!("{} {}", rest, last.trim()))
    }
}

/// Normalize a raw display name.
pub fn normalize(raw: &str) -> NormalizedName {
    let lowered = raw.to_lowercase();
    let reordered = reorder_last_first(&lowered);

    let cleaned: String = reordered
        .chars()
        .filter_map(|c| {
            if c.is_alphabetic() || c == '-' {
                Some(c)
            } else if c.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect();

    let mut tokens: Vec<&str> = cleaned
        .split_whitespace()
        .map(|t| t.trim_matches('-'))
        .filter(|t| !t.is_empty())
        .collect();

    while tokens.len() > 1 && tokens.last().is_some_and(|t| is_suffix(t)) {
        tokens.pop();
    }

    NormalizedName(tokens.join(" "))
}
