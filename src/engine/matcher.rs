//! Candidate selection and rule application.

use std::borrow::Cow;

use crate::index::tokenizer::tokens;
use crate::index::KeywordIndex;
use crate::rule::{RuleEntry, RuleSet};

/// Candidate rule ids for `text`, in rule set order.
///
/// The union of the postings of every distinct token of `text`.
pub fn candidates(text: &str, index: &KeywordIndex) -> Vec<u32> {
    let mut ids: Vec<u32> = tokens(text).flat_map(|t| index.get(&t).iter().copied()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Rewrite `text` with every candidate rule, longest pattern first.
///
/// Rules compound: each one sees the output of the ones before it. The
/// candidate set is taken from the input once and not recomputed after
/// rewrites. Inert rules are skipped. Blank input is returned as is.
pub fn apply(text: &str, rules: &RuleSet, index: &KeywordIndex) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let ids = candidates(text, index);
    let mut out = Cow::Borrowed(text);
    for id in ids {
        if let Some(entry) = rules.get(id) {
            rewrite_with(entry, &mut out);
        }
    }

    out.into_owned()
}

/// Rewrite `text` with every rule, ignoring the keyword index.
///
/// Reaches rules the index cannot (pattern without keywords) and lets
/// replacements trigger later rules. Linear in rule count.
pub fn apply_full_scan(text: &str, rules: &RuleSet) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let mut out = Cow::Borrowed(text);
    for entry in rules {
        rewrite_with(entry, &mut out);
    }

    out.into_owned()
}

fn rewrite_with(entry: &RuleEntry, out: &mut Cow<'_, str>) {
    let rewritten = match entry.rewrite(&**out) {
        Cow::Owned(s) => s,
        Cow::Borrowed(_) => return,
    };
    *out = Cow::Owned(rewritten);
}
