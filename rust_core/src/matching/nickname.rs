//! Given-name nickname expansion.
//!
//! The table is a bidirectional canonical <-> nickname mapping built once and
//! injected into the scorer, so a deployment can swap it (e.g. load a
//! locale-specific list from JSON) without touching the engine.

use crate::error::Result;
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, HashMap};

/// Format: canonical given name -> registered nicknames
const DEFAULT_NICKNAMES: &[(&str, &[&str])] = &[
    ("william", &["will", "bill", "billy", "willy", "liam"]),
    ("robert", &["rob", "bob", "bobby", "robbie"]),
    ("richard", &["rick", "dick", "rich", "richie"]),
    ("michael", &["mike", "mikey", "mick"]),
    ("james", &["jim", "jimmy", "jamie"]),
    ("john", &["jack", "johnny", "jon"]),
    ("thomas", &["tom", "tommy"]),
    ("christopher", &["chris", "kit"]),
    ("matthew", &["matt", "matty"]),
    ("nicholas", &["nick", "nicky"]),
    ("alexander", &["alex", "xander"]),
    ("benjamin", &["ben", "benny"]),
    ("samuel", &["sam", "sammy"]),
    ("daniel", &["dan", "danny"]),
    ("joseph", &["joe", "joey"]),
    ("anthony", &["tony", "ant"]),
    ("andrew", &["andy", "drew"]),
    ("joshua", &["josh"]),
    ("david", &["dave", "davey"]),
    ("edward", &["ed", "eddie", "ted", "teddy"]),
    ("theodore", &["theo", "teddy"]),
    ("charles", &["charlie", "chuck"]),
    ("timothy", &["tim", "timmy"]),
    ("patrick", &["pat", "paddy"]),
    ("nathaniel", &["nate", "nathan"]),
    ("nathan", &["nate"]),
    ("jonathan", &["jon", "jonny"]),
    ("zachary", &["zach", "zack"]),
    ("cameron", &["cam"]),
    ("jacob", &["jake"]),
    ("maxwell", &["max"]),
    ("ryan", &["ry"]),
    ("tyler", &["ty"]),
    ("connor", &["con"]),
    ("lucas", &["luke"]),
    ("luca", &["luke"]),
    ("aidan", &["aiden"]),
    ("cole", &["coley"]),
    ("sebastian", &["seb"]),
];

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Bidirectional nickname table
#[derive(Debug, Clone, Default)]
pub struct NicknameTable {
    /// canonical -> nicknames
    nicknames: FxHashMap<String, Vec<String>>,
    /// nickname -> canonical forms
    canonicals: FxHashMap<String, Vec<String>>,
}

impl NicknameTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in English given-name list.
    pub fn builtin() -> Self {
        Self::from_pairs(DEFAULT_NICKNAMES)
    }

    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let mut table = Self::new();
        for (canonical, nicks) in pairs {
            for nick in *nicks {
                table.insert(canonical, nick);
            }
        }
        table
    }

    /// Load from JSON: `{ "william": ["will", "bill"], ... }`
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (canonical, nicks) in &raw {
            for nick in nicks {
                table.insert(canonical, nick);
            }
        }
        Ok(table)
    }

    /// Register `nickname` under `canonical`. Case-insensitive, duplicates ignored.
    pub fn insert(&mut self, canonical: &str, nickname: &str) {
        let canonical = key(canonical);
        let nickname = key(nickname);
        if canonical.is_empty() || nickname.is_empty() || canonical == nickname {
            return;
        }

        let nicks = self.nicknames.entry(canonical.clone()).or_default();
        if !nicks.contains(&nickname) {
            nicks.push(nickname.clone());
        }

        let canons = self.canonicals.entry(nickname).or_default();
        if !canons.contains(&canonical) {
            canons.push(canonical);
        }
    }

    /// Every interchangeable spelling of `first_token`, itself included.
    pub fn expand(&self, first_token: &str) -> BTreeSet<String> {
        let token = key(first_token);
        let mut variants = BTreeSet::new();
        if token.is_empty() {
            return variants;
        }

        // Canonical form: add its nicknames
        if let Some(nicks) = self.nicknames.get(&token) {
            variants.extend(nicks.iter().cloned());
        }

        // Nickname: add each canonical form and its other nicknames
        if let Some(canons) = self.canonicals.get(&token) {
            for canonical in canons {
                variants.insert(canonical.clone());
                if let Some(siblings) = self.nicknames.get(canonical) {
                    variants.extend(siblings.iter().cloned());
                }
            }
        }

        variants.insert(token);
        variants
    }

    /// True when the two given names are registered variants of each other
    pub fn are_variants(&self, a: &str, b: &str) -> bool {
        self.expand(a).contains(&key(b))
    }

    /// Number of canonical names
    pub fn len(&self) -> usize {
        self.nicknames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nicknames.is_empty()
    }

    /// All registered (canonical, nickname) pairs
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .nicknames
            .iter()
            .flat_map(|(canonical, nicks)| {
                nicks
                    .iter()
                    .map(move |nick| (canonical.clone(), nick.clone()))
            })
            .collect();
        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_expands_to_nicknames() {
        let table = NicknameTable::builtin();
        let variants = table.expand("William");
        assert!(variants.contains("william"));
        assert!(variants.contains("will"));
        assert!(variants.contains("bill"));
        assert!(variants.contains("liam"));
    }

    #[test]
    fn test_nickname_expands_to_canonical_and_siblings() {
        let table = NicknameTable::builtin();
        let variants = table.expand("bill");
        assert!(variants.contains("bill"));
        assert!(variants.contains("william"));
        assert!(variants.contains("will"));
        assert!(variants.contains("billy"));
    }

    #[test]
    fn test_nickname_with_multiple_canonicals() {
        let table = NicknameTable::builtin();
        // "jon" is registered under both john and jonathan
        let variants = table.expand("jon");
        assert!(variants.contains("john"));
        assert!(variants.contains("jonathan"));
        assert!(variants.contains("jack"));
        assert!(variants.contains("jonny"));

        // "nathan" is canonical and a nickname of nathaniel
        let variants = table.expand("nathan");
        assert!(variants.contains("nate"));
        assert!(variants.contains("nathaniel"));
    }

    #[test]
    fn test_unknown_is_singleton() {
        let table = NicknameTable::builtin();
        let variants = table.expand("Quinn");
        assert_eq!(variants.len(), 1);
        assert!(variants.contains("quinn"));
        assert!(table.expand("").is_empty());
    }

    #[test]
    fn test_symmetry_over_builtin_pairs() {
        let table = NicknameTable::builtin();
        for (canonical, nick) in table.pairs() {
            assert!(table.expand(&canonical).contains(&nick), "{} -> {}", canonical, nick);
            assert!(table.expand(&nick).contains(&canonical), "{} -> {}", nick, canonical);
        }
    }

    #[test]
    fn test_insert_ignores_self_and_duplicates() {
        let mut table = NicknameTable::new();
        table.insert("Max", "max");
        assert!(table.is_empty());
        table.insert("Maxwell", "Max");
        table.insert("maxwell", "MAX");
        assert_eq!(table.pairs(), vec![("maxwell".to_string(), "max".to_string())]);
        assert!(table.are_variants("max", "Maxwell"));
    }

    #[test]
    fn test_from_json() {
        let table = NicknameTable::from_json(r#"{"aleksandr": ["sasha", "sanya"]}"#).unwrap();
        assert!(table.expand("sasha").contains("sanya"));
        assert!(table.expand("aleksandr").contains("sasha"));
        assert!(NicknameTable::from_json("not json").is_err());
    }
}
