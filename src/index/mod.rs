//! Keyword index over a rule set.
//!
//! Each rule is registered under the lowercase alphanumeric tokens of its
//! pattern source. At match time the tokens of the input select a small
//! candidate subset of the rule set, so matching cost follows input length
//! rather than rule count.
//!
//! The index is a filter, never a guarantee: a candidate may still fail to
//! match, and a rule whose pattern has no tokens is never a candidate.

mod builder;
pub mod tokenizer;

pub use builder::{build_index, IndexBuilder, IndexedRules};

use ahash::RandomState;
use std::collections::HashMap;

/// Inverted map from lowercase token to ascending rule ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordIndex {
    postings: HashMap<String, Vec<u32>, RandomState>,
}

impl KeywordIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` under `token`.
    ///
    /// Ids must be added in ascending order; repeats are ignored.
    pub(crate) fn insert(&mut self, token: String, id: u32) {
        let ids = self.postings.entry(token).or_default();
        if ids.last() != Some(&id) {
            ids.push(id);
        }
    }

    /// Insert a whole posting list (cache load).
    pub(crate) fn insert_postings(&mut self, token: String, ids: Vec<u32>) {
        self.postings.insert(token, ids);
    }

    /// Rule ids registered under `token`.
    pub fn get(&self, token: &str) -> &[u32] {
        self.postings.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if `token` is a keyword.
    pub fn contains(&self, token: &str) -> bool {
        self.postings.contains_key(token)
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the index has no keywords.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Total number of (keyword, rule) pairs.
    pub fn posting_count(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }

    /// Keywords and their postings, sorted by keyword.
    pub fn sorted(&self) -> Vec<(&str, &[u32])> {
        let mut entries: Vec<_> = self
            .postings
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Number of rules in `0..rule_count` that appear under no keyword.
    pub fn unreachable_count(&self, rule_count: usize) -> usize {
        let mut seen = vec![false; rule_count];
        for ids in self.postings.values() {
            for &id in ids {
                if let Some(slot) = seen.get_mut(id as usize) {
                    *slot = true;
                }
            }
        }
        seen.iter().filter(|s| !**s).count()
    }
}
