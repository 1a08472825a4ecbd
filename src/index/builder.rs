//! Index construction.

use super::tokenizer::pattern_tokens;
use super::KeywordIndex;
use crate::rule::{Rule, RuleEntry, RuleSet};

/// A rule set together with its keyword index.
///
/// Both halves are read-only once built; ids in the index are positions in
/// the rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedRules {
    pub rules: RuleSet,
    pub index: KeywordIndex,
}

impl IndexedRules {
    /// Split into the `(RuleSet, KeywordIndex)` pair.
    pub fn into_parts(self) -> (RuleSet, KeywordIndex) {
        (self.rules, self.index)
    }
}

/// Builds an [`IndexedRules`] from rules in file order.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    rules: Vec<Rule>,
}

impl IndexBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; file order is kept for equal-length patterns.
    pub fn add(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Add many rules.
    pub fn extend<I: IntoIterator<Item = Rule>>(&mut self, rules: I) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    /// Sort, compile and index the collected rules.
    pub fn build(self) -> IndexedRules {
        let mut rules = self.rules;

        // Stable: equal-length patterns keep file order.
        rules.sort_by(|a, b| b.pattern().len().cmp(&a.pattern().len()));

        let mut index = KeywordIndex::new();
        let mut entries = Vec::with_capacity(rules.len());
        let mut invalid = 0usize;
        let mut unreachable = 0usize;

        for (id, rule) in rules.into_iter().enumerate() {
            let id = id as u32;

            let tokens = pattern_tokens(rule.pattern());
            if tokens.is_empty() {
                unreachable += 1;
                log::debug!("Rule {} has no keywords: {:?}", id, rule.pattern());
            }
            for token in tokens {
                index.insert(token, id);
            }

            let entry = RuleEntry::compiled(rule);
            if !entry.is_valid() {
                invalid += 1;
                log::debug!("Rule {} is not a valid regex: {:?}", id, entry.rule().pattern());
            }
            entries.push(entry);
        }

        log::info!(
            "Index built: {} rules, {} keywords ({} invalid, {} unreachable)",
            entries.len(),
            index.len(),
            invalid,
            unreachable
        );

        IndexedRules {
            rules: RuleSet::from_entries(entries),
            index,
        }
    }
}

/// Build the rule set and keyword index from rules in file order.
pub fn build_index(rules: Vec<Rule>) -> IndexedRules {
    let mut builder = IndexBuilder::new();
    builder.extend(rules);
    builder.build()
}
