//! Rule records and the priority-ordered rule set.

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::ops::Index;

/// A single pattern → replacement substitution.
///
/// The pattern is regex source and is never validated here; see
/// [`RuleSet`] for the compiled form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pattern: String,
    replacement: String,
}

impl Rule {
    /// Create a rule from its two halves.
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Regex source of this rule.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Replacement text, in `regex` substitution syntax.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Compile a pattern the way every rule is matched: case-insensitively.
pub(crate) fn compile_pattern(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// A rule together with its validity flag and lazily compiled regex.
#[derive(Debug, Clone)]
pub struct RuleEntry {
    rule: Rule,
    valid: bool,
    regex: OnceCell<Option<Regex>>,
}

impl RuleEntry {
    /// Compile the rule now, recording whether it is usable.
    pub(crate) fn compiled(rule: Rule) -> Self {
        let regex = compile_pattern(rule.pattern());
        let valid = regex.is_some();
        Self {
            rule,
            valid,
            regex: OnceCell::with_value(regex),
        }
    }

    /// Rebuild an entry whose validity is already known (cache load).
    ///
    /// The regex is compiled on first use.
    pub(crate) fn with_validity(rule: Rule, valid: bool) -> Self {
        Self {
            rule,
            valid,
            regex: OnceCell::new(),
        }
    }

    /// The underlying rule.
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Whether the pattern compiles as a regex.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Compiled regex, or `None` for an inert rule.
    pub fn regex(&self) -> Option<&Regex> {
        if !self.valid {
            return None;
        }
        self.regex
            .get_or_init(|| compile_pattern(self.rule.pattern()))
            .as_ref()
    }

    /// Apply this rule to `text`, borrowing when nothing matched.
    pub fn rewrite<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.regex() {
            Some(regex) => regex.replace_all(text, self.rule.replacement()),
            None => Cow::Borrowed(text),
        }
    }
}

impl PartialEq for RuleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule && self.valid == other.valid
    }
}

impl Eq for RuleEntry {}

/// Rules in matching-priority order: longest pattern source first.
///
/// A rule's position is its permanent id; the keyword index refers to
/// rules by these ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    entries: Vec<RuleEntry>,
}

impl RuleSet {
    /// Wrap entries that are already in priority order.
    pub(crate) fn from_entries(entries: Vec<RuleEntry>) -> Self {
        Self { entries }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rule entry by id.
    pub fn get(&self, id: u32) -> Option<&RuleEntry> {
        self.entries.get(id as usize)
    }

    /// Iterate entries in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, RuleEntry> {
        self.entries.iter()
    }

    /// Position of the first rule with this exact pattern source.
    pub fn position(&self, pattern: &str) -> Option<u32> {
        self.entries
            .iter()
            .position(|e| e.rule().pattern() == pattern)
            .map(|i| i as u32)
    }

    /// Number of rules whose pattern failed to compile.
    pub fn invalid_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_valid()).count()
    }
}

impl Index<u32> for RuleSet {
    type Output = RuleEntry;

    fn index(&self, id: u32) -> &Self::Output {
        &self.entries[id as usize]
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a RuleEntry;
    type IntoIter = std::slice::Iter<'a, RuleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
