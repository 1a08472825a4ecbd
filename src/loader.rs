//! Cache-or-rebuild loading of a rule index.

use std::fs::File;
use std::path::Path;

use crate::cache;
use crate::config::EngineConfig;
use crate::index::{build_index, IndexedRules, KeywordIndex};
use crate::parser::RuleParser;
use crate::rule::RuleSet;
use crate::{Error, Result};

/// Where a loaded index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    /// Decoded from a fresh cache file
    Cache,
    /// Parsed and built from the rule file
    Rebuilt,
    /// Built by the caller and handed to the engine
    Memory,
}

/// Load the index for `config`, reusing the cache when it is fresh.
///
/// Only a missing or unreadable rule file is an error. A failed cache save
/// is logged and the freshly built index is still returned.
pub fn load_or_build(config: &EngineConfig) -> Result<(IndexedRules, IndexSource)> {
    if let Some(indexed) = cache::load(&config.rule_path, &config.cache_path) {
        return Ok((indexed, IndexSource::Cache));
    }

    let indexed = rebuild(&config.rule_path)?;

    if config.persist_cache {
        if let Err(e) = cache::save(&config.cache_path, &indexed, config.compress_cache) {
            log::warn!("Failed to save index cache {:?}: {}", config.cache_path, e);
        }
    }

    Ok((indexed, IndexSource::Rebuilt))
}

/// Parse and index the rule file, ignoring any cache.
pub fn rebuild(rule_path: &Path) -> Result<IndexedRules> {
    let file = match File::open(rule_path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::RuleSourceMissing(rule_path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    log::info!("Indexing rule file {:?}", rule_path);
    let parsed = RuleParser::parse_reader(file)?;
    if !parsed.skipped.is_empty() {
        log::info!("Skipped {} malformed rule lines", parsed.skipped.len());
    }

    Ok(build_index(parsed.rules))
}

/// Load the rule set and keyword index for a rule file and cache path.
///
/// See [`load_or_build`] for the cache policy.
pub fn load_or_build_index(rule_path: impl AsRef<Path>, cache_path: impl AsRef<Path>) -> Result<(RuleSet, KeywordIndex)> {
    let config = EngineConfig::new(rule_path.as_ref(), cache_path.as_ref());
    let (indexed, _) = load_or_build(&config)?;
    Ok(indexed.into_parts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn age(path: &Path, secs: u64) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_missing_rule_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path().join("missing.txt"), dir.path().join("missing.idx"));

        let err = load_or_build(&config).unwrap_err();
        assert!(matches!(err, Error::RuleSourceMissing(_)));
        assert!(!config.cache_path.exists());
    }

    #[test]
    fn test_rebuild_then_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path().join("rules.txt"), dir.path().join("rules.idx"));
        fs::write(&config.rule_path, "cake => dessert\npie => tart\n").unwrap();
        age(&config.rule_path, 60);

        let (first, source) = load_or_build(&config).unwrap();
        assert_eq!(source, IndexSource::Rebuilt);
        assert!(config.cache_path.exists());

        let (second, source) = load_or_build(&config).unwrap();
        assert_eq!(source, IndexSource::Cache);
        assert_eq!(first, second);
    }

    #[test]
    fn test_persist_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::new(dir.path().join("rules.txt"), dir.path().join("rules.idx"));
        config.persist_cache = false;
        fs::write(&config.rule_path, "cake => dessert\n").unwrap();

        let (_, source) = load_or_build(&config).unwrap();
        assert_eq!(source, IndexSource::Rebuilt);
        assert!(!config.cache_path.exists());
    }

    #[test]
    fn test_unwritable_cache_still_returns_index() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let config = EngineConfig::new(dir.path().join("rules.txt"), blocker.join("rules.idx"));
        fs::write(&config.rule_path, "cake => dessert\n").unwrap();

        let (indexed, source) = load_or_build(&config).unwrap();
        assert_eq!(source, IndexSource::Rebuilt);
        assert_eq!(indexed.rules.len(), 1);
    }

    #[test]
    fn test_load_or_build_index_pair() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.txt");
        fs::write(&rules, "ab => X\nabc => Y\n").unwrap();

        let (set, index) = load_or_build_index(&rules, dir.path().join("rules.idx")).unwrap();
        assert_eq!(set.position("abc"), Some(0));
        assert_eq!(index.get("ab"), &[1]);
    }
}
