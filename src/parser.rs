//! Rule file parser.
//!
//! The rule file is line oriented:
//!
//! ```text
//! # comment
//! \b(colour|color)\b => hue
//! how to bake a cake => a recipe => with steps
//! ```
//!
//! Everything before the first `=>` is the pattern, everything after it is
//! the replacement. Both halves are trimmed.

use std::io::Read;

use crate::error::SkipReason;
use crate::rule::Rule;
use crate::Result;

/// Token separating pattern from replacement.
pub const SEPARATOR: &str = "=>";

/// A line the parser could not turn into a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    /// Why the line was skipped
    pub reason: SkipReason,
}

/// Parser output: rules in file order plus skipped lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRules {
    pub rules: Vec<Rule>,
    pub skipped: Vec<SkippedLine>,
}

/// Rule file parser.
pub struct RuleParser;

impl RuleParser {
    /// Parse rule file contents.
    pub fn parse(contents: &str) -> ParsedRules {
        let mut parsed = ParsedRules::default();

        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Ok(rule) => parsed.rules.push(rule),
                Err(reason) => {
                    log::debug!("Skipping rule line {}: {}", idx + 1, reason);
                    parsed.skipped.push(SkippedLine {
                        line: idx + 1,
                        reason,
                    });
                }
            }
        }

        parsed
    }

    /// Parse rules from a reader.
    ///
    /// Invalid UTF-8 sequences are dropped rather than rejected.
    pub fn parse_reader<R: Read>(mut reader: R) -> Result<ParsedRules> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::parse(&decode_dropping_invalid(&bytes)))
    }
}

fn parse_line(line: &str) -> std::result::Result<Rule, SkipReason> {
    let (pattern, replacement) = line
        .split_once(SEPARATOR)
        .ok_or(SkipReason::MissingSeparator)?;

    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(SkipReason::EmptyPattern);
    }

    Ok(Rule::new(pattern, replacement.trim()))
}

/// Decode UTF-8, silently dropping invalid byte sequences.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules() {
        let text = r#"
# Comment
hello => hi
  \bcolou?r\b   =>   hue
=> orphan replacement
no separator here
arrow => a => b
"#;

        let parsed = RuleParser::parse(text);

        assert_eq!(
            parsed.rules,
            vec![
                Rule::new("hello", "hi"),
                Rule::new(r"\bcolou?r\b", "hue"),
                Rule::new("arrow", "a => b"),
            ]
        );
        assert_eq!(
            parsed.skipped,
            vec![
                SkippedLine {
                    line: 5,
                    reason: SkipReason::EmptyPattern
                },
                SkippedLine {
                    line: 6,
                    reason: SkipReason::MissingSeparator
                },
            ]
        );
    }

    #[test]
    fn test_empty_replacement_is_allowed() {
        let parsed = RuleParser::parse("drop me =>");
        assert_eq!(parsed.rules, vec![Rule::new("drop me", "")]);
    }

    #[test]
    fn test_invalid_regex_is_kept() {
        let parsed = RuleParser::parse("(broken => fixed");
        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.rules[0].pattern(), "(broken");
    }

    #[test]
    fn test_parse_reader_drops_invalid_utf8() {
        let bytes: &[u8] = b"caf\xff\xfee => coffee\n\xc3\xa9t\xc3\xa9 => summer\n";
        let parsed = RuleParser::parse_reader(bytes).unwrap();

        assert_eq!(
            parsed.rules,
            vec![Rule::new("cafe", "coffee"), Rule::new("été", "summer")]
        );
    }

    #[test]
    fn test_comment_with_separator_is_ignored() {
        let parsed = RuleParser::parse("   # old => new\n");
        assert!(parsed.rules.is_empty());
        assert!(parsed.skipped.is_empty());
    }
}
