//! Index statistics.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::index::IndexedRules;
use crate::loader::IndexSource;

/// Summary of a loaded index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Rules in the rule set
    pub rule_count: usize,
    /// Distinct keywords
    pub keyword_count: usize,
    /// Total (keyword, rule) pairs
    pub posting_count: usize,
    /// Rules whose pattern is not a valid regex
    pub invalid_rules: usize,
    /// Rules with no keyword, never selected as candidates
    pub unreachable_rules: usize,
    /// Whether the index came from the cache or a rebuild
    pub source: IndexSource,
    /// When the index was loaded into this process
    #[serde(with = "system_time_serde")]
    pub loaded_at: Option<SystemTime>,
}

mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => {
                let duration = t.duration_since(UNIX_EPOCH).unwrap_or_default();
                Some(duration.as_secs()).serialize(serializer)
            }
            None => None::<u64>.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(|s| UNIX_EPOCH + Duration::from_secs(s)))
    }
}

impl IndexStats {
    /// Collect statistics for `indexed`.
    pub fn collect(indexed: &IndexedRules, source: IndexSource, loaded_at: SystemTime) -> Self {
        let rule_count = indexed.rules.len();
        Self {
            rule_count,
            keyword_count: indexed.index.len(),
            posting_count: indexed.index.posting_count(),
            invalid_rules: indexed.rules.invalid_count(),
            unreachable_rules: indexed.index.unreachable_count(rule_count),
            source,
            loaded_at: Some(loaded_at),
        }
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
