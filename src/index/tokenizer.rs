//! Alphanumeric tokenizer shared by the index builder and the matcher.
//!
//! A token is a maximal run of alphanumeric characters, lowercased.
//! Everything else, including `_`, separates tokens.
//!
//! [`tokens`] and [`pattern_tokens`] differ only in escape handling: a
//! pattern's `\b` or `\s` is a separator, while plain text has no escapes.

/// Iterator over the lowercase tokens of `text`.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Tokens of a regex pattern source.
///
/// An escape sequence (a backslash and the character after it) acts as a
/// separator, so `\bhow\s+to` yields `how` and `to` rather than `bhow`.
pub fn pattern_tokens(pattern: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            flush(&mut current, &mut out);
            chars.next();
        } else if c.is_alphanumeric() {
            current.push(c);
        } else {
            flush(&mut current, &mut out);
        }
    }
    flush(&mut current, &mut out);

    out
}

fn flush(current: &mut String, out: &mut Vec<String>) {
    if !current.is_empty() {
        out.push(current.to_lowercase());
        current.clear();
    }
}
