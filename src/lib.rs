//! phraserule - A keyword-indexed phrase rewriting engine.
//!
//! This crate rewrites free-form text with a large list of
//! `pattern => replacement` rules, where each pattern is a regular
//! expression matched case-insensitively.
//!
//! # Features
//!
//! - **Keyword index**: only rules sharing a word with the input are tried,
//!   so matching cost follows input length rather than rule count
//! - **Longest pattern first**: rules apply in descending pattern length
//! - **Binary cache**: the built index is persisted next to the rule file and
//!   reused until the rule file changes
//! - **Fail-soft**: corrupt caches rebuild, invalid patterns are inert
//! - **Hot reload**: swap in new rules without stopping readers
//!
//! # Quick Start
//!
//! ```ignore
//! use phraserule::Engine;
//!
//! let engine = Engine::initialize("list.txt", "list.txt.idx")?;
//! let out = engine.transform("How to bake a cake please");
//! ```
//!
//! The lower-level pieces are available on their own:
//!
//! ```ignore
//! use phraserule::{apply, load_or_build_index};
//!
//! let (rules, index) = load_or_build_index("list.txt", "list.txt.idx")?;
//! let out = apply("How to bake a cake please", &rules, &index);
//! ```
//!
//! # Rule File Format
//!
//! ```text
//! # comment
//! \b(colour|color)\b => hue
//! how to bake a cake => a recipe with numbered steps
//! ```
//!
//! Replacements use the `regex` crate's syntax: `$1`, `${name}`, `$$`.
//!
//! # Matching
//!
//! 1. The input is split into lowercase alphanumeric tokens
//! 2. Rules registered under any of those tokens become candidates
//! 3. Candidates are applied in rule set order, each to the output of the
//!    previous one

mod error;
mod loader;
mod stats;

pub mod cache;
pub mod config;
pub mod engine;
pub mod index;
pub mod parser;
pub mod rule;

// Re-export core types
pub use error::{Error, Result, SkipReason};
pub use rule::{Rule, RuleEntry, RuleSet};

// Re-export index types
pub use index::{build_index, IndexBuilder, IndexedRules, KeywordIndex};

// Re-export parser types
pub use parser::{ParsedRules, RuleParser, SkippedLine};

// Re-export engine API
pub use config::EngineConfig;
pub use engine::{apply, apply_full_scan, candidates, Engine, Snapshot};
pub use loader::{load_or_build, load_or_build_index, rebuild, IndexSource};
pub use stats::IndexStats;
