//! Surname blocking index.
//!
//! Reference records are bucketed by a short key taken from the normalized
//! surname, so each query is only scored against a handful of candidates
//! instead of the whole population. Small or empty buckets are widened with
//! buckets whose key is within `block_fuzzy_tolerance` (typo in the first
//! letters of a surname).

use super::normalize::{normalize, NormalizedName};
use crate::config::MatcherConfig;
use crate::models::ReferenceRecord;
use rustc_hash::FxHashMap;
use strsim::normalized_levenshtein;
use tracing::debug;

/// Number of leading surname characters forming a block key
pub const BLOCK_KEY_LEN: usize = 3;

/// Block key for a normalized surname: its first three characters, or the
/// whole surname when shorter.
pub fn block_key(surname: &str) -> String {
    surname.chars().take(BLOCK_KEY_LEN).collect()
}

/// Reference record with its normalized name cached
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub record: ReferenceRecord,
    pub name: NormalizedName,
}

/// Immutable blocking index over one reference population
#[derive(Debug, Clone)]
pub struct BlockingIndex {
    /// Population in input order; empty names are kept but never bucketed
    records: Vec<IndexedRecord>,
    /// block key -> positions in `records`
    buckets: FxHashMap<String, Vec<usize>>,
    /// Bucket keys, sorted for deterministic fuzzy expansion
    keys: Vec<String>,
    fuzzy_tolerance: f64,
    small_block_size: usize,
}

impl BlockingIndex {
    /// Build the index once per batch run.
    pub fn build(population: Vec<ReferenceRecord>, config: &MatcherConfig) -> Self {
        let mut buckets: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut records = Vec::with_capacity(population.len());

        for (pos, record) in population.into_iter().enumerate() {
            let name = normalize(&record.full_name);
            if let Some(surname) = name.surname() {
                buckets.entry(block_key(surname)).or_default().push(pos);
            }
            records.push(IndexedRecord { record, name });
        }

        let mut keys: Vec<String> = buckets.keys().cloned().collect();
        keys.sort();

        debug!(
            "Built blocking index: {} records, {} buckets",
            records.len(),
            keys.len()
        );

        Self {
            records,
            buckets,
            keys,
            fuzzy_tolerance: config.block_fuzzy_tolerance,
            small_block_size: config.small_block_size,
        }
    }

    /// Candidates for a block key: the exact bucket, widened with similar
    /// keys when that bucket is empty or small. Returned in population order.
    pub fn candidates(&self, key: &str) -> Vec<&IndexedRecord> {
        if key.is_empty() {
            return Vec::new();
        }

        let mut positions: Vec<usize> = self.buckets.get(key).cloned().unwrap_or_default();

        if positions.len() <= self.small_block_size {
            for other in &self.keys {
                if other == key {
                    continue;
                }
                if normalized_levenshtein(key, other) >= self.fuzzy_tolerance {
                    if let Some(bucket) = self.buckets.get(other) {
                        positions.extend_from_slice(bucket);
                    }
                }
            }
            positions.sort_unstable();
            positions.dedup();
        }

        positions.iter().map(|&pos| &self.records[pos]).collect()
    }

    /// Bounded slice of the population for when blocking finds nothing.
    /// Records without a usable name are skipped.
    pub fn fallback_sample(&self, limit: usize) -> Vec<&IndexedRecord> {
        self.records
            .iter()
            .filter(|r| !r.name.is_empty())
            .take(limit)
            .collect()
    }

    pub fn records(&self) -> &[IndexedRecord] {
        &self.records
    }

    /// Number of records in the population
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population() -> Vec<ReferenceRecord> {
        vec![
            ReferenceRecord::new("p1", "Mike Johnson"),
            ReferenceRecord::new("p2", "Mike Johnston"),
            ReferenceRecord::new("p3", "Jack Hughes"),
            ReferenceRecord::new("p4", "Quinn Hughes"),
            ReferenceRecord::new("p5", "Gavin Li"),
            ReferenceRecord::new("p6", "!!!"),
        ]
    }

    fn ids(records: &[&IndexedRecord]) -> Vec<String> {
        records.iter().map(|r| r.record.reference_id.clone()).collect()
    }

    #[test]
    fn test_block_key() {
        assert_eq!(block_key("johnson"), "joh");
        assert_eq!(block_key("li"), "li");
        assert_eq!(block_key(""), "");
    }

    #[test]
    fn test_build_skips_empty_names() {
        let index = BlockingIndex::build(population(), &MatcherConfig::default());
        assert_eq!(index.len(), 6);
        // joh, hug, li
        assert_eq!(index.bucket_count(), 3);
        assert_eq!(index.fallback_sample(10).len(), 5);
    }

    #[test]
    fn test_exact_bucket() {
        let index = BlockingIndex::build(population(), &MatcherConfig::default());
        assert_eq!(ids(&index.candidates("joh")), vec!["p1", "p2"]);
        assert_eq!(ids(&index.candidates("hug")), vec!["p3", "p4"]);
    }

    #[test]
    fn test_fuzzy_expansion_handles_typo() {
        let index = BlockingIndex::build(population(), &MatcherConfig::default());
        // "jahnson" -> "jah", one edit away from "joh"
        assert_eq!(ids(&index.candidates("jah")), vec!["p1", "p2"]);
        assert!(index.candidates("zzz").is_empty());
    }

    #[test]
    fn test_large_bucket_is_not_widened() {
        let mut pop = population();
        for i in 0..5 {
            pop.push(ReferenceRecord::new(format!("h{}", i), "Someone Hugo"));
        }
        let config = MatcherConfig {
            small_block_size: 2,
            ..Default::default()
        };
        let index = BlockingIndex::build(pop, &config);
        let found = ids(&index.candidates("hug"));
        assert_eq!(found.len(), 7);
        assert!(found.iter().all(|id| id.starts_with('h') || id == "p3" || id == "p4"));
    }

    #[test]
    fn test_fallback_sample_is_capped() {
        let index = BlockingIndex::build(population(), &MatcherConfig::default());
        assert_eq!(ids(&index.fallback_sample(2)), vec!["p1", "p2"]);
        assert!(index.fallback_sample(0).is_empty());
    }
}
