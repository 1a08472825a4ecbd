//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default capacity of the transform-result cache.
pub const DEFAULT_RESULT_CACHE_CAPACITY: usize = 10_000;

/// Extension appended to the rule file name for the default cache path.
pub const CACHE_EXTENSION: &str = "idx";

fn default_result_cache_capacity() -> usize {
    DEFAULT_RESULT_CACHE_CAPACITY
}

fn default_true() -> bool {
    true
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule file, the source of truth
    pub rule_path: PathBuf,
    /// Binary index cache derived from the rule file
    pub cache_path: PathBuf,
    /// Maximum number of memoized transform results; 0 disables memoization
    #[serde(default = "default_result_cache_capacity")]
    pub result_cache_capacity: usize,
    /// Whether a rebuilt index is written back to `cache_path`
    #[serde(default = "default_true")]
    pub persist_cache: bool,
    /// LZ4-compress the cache payload (needs the `compression` feature)
    #[serde(default)]
    pub compress_cache: bool,
}

impl EngineConfig {
    /// Create a configuration with default options.
    pub fn new(rule_path: impl Into<PathBuf>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            rule_path: rule_path.into(),
            cache_path: cache_path.into(),
            result_cache_capacity: DEFAULT_RESULT_CACHE_CAPACITY,
            persist_cache: true,
            compress_cache: false,
        }
    }

    /// Configuration whose cache sits next to the rule file.
    ///
    /// `rules/list.txt` caches to `rules/list.txt.idx`.
    pub fn for_rules(rule_path: impl Into<PathBuf>) -> Self {
        let rule_path = rule_path.into();
        let cache_path = default_cache_path(&rule_path);
        Self::new(rule_path, cache_path)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the result cache capacity.
    pub fn with_result_cache(mut self, capacity: usize) -> Self {
        self.result_cache_capacity = capacity;
        self
    }

    /// Disable the result cache.
    pub fn no_result_cache(self) -> Self {
        self.with_result_cache(0)
    }

    /// Check that the paths are usable.
    pub fn validate(&self) -> Result<()> {
        if self.rule_path.as_os_str().is_empty() {
            return Err(Error::Config("rule_path is empty".to_string()));
        }
        if self.cache_path.as_os_str().is_empty() {
            return Err(Error::Config("cache_path is empty".to_string()));
        }
        if self.cache_path == self.rule_path {
            return Err(Error::Config("cache_path must differ from rule_path".to_string()));
        }
        Ok(())
    }
}

/// Default cache location for a rule file.
pub fn default_cache_path(rule_path: &Path) -> PathBuf {
    let mut name = rule_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(CACHE_EXTENSION);
    rule_path.with_file_name(name)
}
