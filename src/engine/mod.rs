//! Text rewriting engine with hot reload support.
//!
//! [`Engine`] owns a loaded index and serves transforms from it:
//! - The index is shared behind an `Arc` and never mutated
//! - Reloads build a new index and swap it in atomically
//! - An optional LRU cache memoizes transform results per index

mod matcher;

pub use matcher::{apply, apply_full_scan, candidates};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use quick_cache::sync::Cache;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::EngineConfig;
use crate::index::IndexedRules;
use crate::loader::{self, IndexSource};
use crate::stats::IndexStats;
use crate::Result;

/// Longest input or output, in bytes, kept in the result cache.
pub const MAX_CACHED_TEXT_LEN: usize = 4096;

/// An index together with where and when it was loaded.
///
/// Memoized transform results live here too, so a reload swaps them out
/// with the index they were computed from.
pub struct Snapshot {
    pub indexed: IndexedRules,
    pub source: IndexSource,
    pub loaded_at: SystemTime,
    results: Option<Cache<String, String>>,
}

impl Snapshot {
    fn new(indexed: IndexedRules, source: IndexSource, result_cache_capacity: usize) -> Self {
        let results = if result_cache_capacity > 0 {
            Some(Cache::new(result_cache_capacity))
        } else {
            None
        };

        Self {
            indexed,
            source,
            loaded_at: SystemTime::now(),
            results,
        }
    }

    /// Rewrite `text` with this index, memoizing short inputs.
    fn transform(&self, text: &str) -> String {
        let cache = match self.results {
            Some(ref cache) if text.len() <= MAX_CACHED_TEXT_LEN => cache,
            _ => return apply(text, &self.indexed.rules, &self.indexed.index),
        };

        if let Some(hit) = cache.get(text) {
            return hit;
        }

        let out = apply(text, &self.indexed.rules, &self.indexed.index);
        if out.len() <= MAX_CACHED_TEXT_LEN {
            cache.insert(text.to_string(), out.clone());
        }
        out
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("indexed", &self.indexed)
            .field("source", &self.source)
            .field("loaded_at", &self.loaded_at)
            .field("cached_results", &self.results.as_ref().map(|c| c.len()))
            .finish()
    }
}

/// Rule engine handle.
///
/// Construct once, then share by reference (it is `Send + Sync`). The read
/// path takes no locks.
///
/// # Example
///
/// ```ignore
/// use phraserule::Engine;
///
/// let engine = Engine::initialize("list.txt", "list.txt.idx")?;
/// let out = engine.transform("How to bake a cake");
///
/// // Pick up edits to list.txt
/// engine.reload()?;
/// ```
pub struct Engine {
    /// Current index and its result cache, wrapped in ArcSwap for atomic replacement.
    inner: ArcSwap<Snapshot>,
    /// Configuration.
    config: EngineConfig,
    /// Serializes reloads so only one rebuild writes the cache at a time.
    reload_lock: Mutex<()>,
    /// Generation counter, bumped on every successful reload.
    generation: AtomicU64,
}

impl Engine {
    /// Load the index for a rule file and cache path with default options.
    ///
    /// Fails only when there is no fresh cache and the rule file is absent
    /// or unreadable.
    pub fn initialize(rule_path: impl AsRef<Path>, cache_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(EngineConfig::new(rule_path.as_ref(), cache_path.as_ref()))
    }

    /// Load the index described by `config`.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let snapshot = Self::load(&config)?;
        Ok(Self::from_snapshot(snapshot, config))
    }

    /// Serve an already built index. Nothing is read from or written to disk.
    ///
    /// Stats report the source as [`IndexSource::Memory`]; [`reload`](Self::reload)
    /// still reads the paths in `config`.
    pub fn from_indexed(indexed: IndexedRules, config: EngineConfig) -> Self {
        let snapshot = Snapshot::new(indexed, IndexSource::Memory, config.result_cache_capacity);
        Self::from_snapshot(snapshot, config)
    }

    fn from_snapshot(snapshot: Snapshot, config: EngineConfig) -> Self {
        Self {
            inner: ArcSwap::from_pointee(snapshot),
            config,
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    fn load(config: &EngineConfig) -> Result<Snapshot> {
        let (indexed, source) = loader::load_or_build(config)?;
        Ok(Snapshot::new(indexed, source, config.result_cache_capacity))
    }

    /// Rewrite `text` with the current rules.
    ///
    /// Never fails; text no rule applies to comes back unchanged.
    pub fn transform(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        self.inner.load().transform(text)
    }

    /// Reload from the rule file (or a fresh cache) and swap atomically.
    ///
    /// Transforms in flight finish on the old index and memoize into its
    /// cache, which is dropped with it. On error the old index stays in place.
    pub fn reload(&self) -> Result<()> {
        let _guard = self.reload_lock.lock();

        let snapshot = Self::load(&self.config)?;
        self.inner.store(Arc::new(snapshot));

        self.generation.fetch_add(1, Ordering::SeqCst);

        log::info!("Reloaded rules from {:?}", self.config.rule_path);
        Ok(())
    }

    /// The index currently being served.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }

    /// Statistics for the current index.
    pub fn stats(&self) -> IndexStats {
        let snapshot = self.inner.load();
        IndexStats::collect(&snapshot.indexed, snapshot.source, snapshot.loaded_at)
    }

    /// Number of successful reloads.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Number of memoized transform results for the current index.
    pub fn cached_results(&self) -> usize {
        self.inner.load().results.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::rule::Rule;
    use crate::Error;
    use std::fs::{self, File};
    use std::time::Duration;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_transform_basic() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("list.txt");
        fs::write(&rules, "cake => pie\n").unwrap();

        let engine = Engine::initialize(&rules, dir.path().join("list.idx")).unwrap();
        assert_eq!(engine.transform("I like CAKE"), "I like pie");
        assert_eq!(engine.transform("nothing here"), "nothing here");
        assert_eq!(engine.transform("   "), "   ");
    }

    #[test]
    fn test_initialize_without_rules_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Engine::initialize(dir.path().join("none.txt"), dir.path().join("none.idx"));
        assert!(matches!(result, Err(Error::RuleSourceMissing(_))));
    }

    #[test]
    fn test_result_cache() {
        let indexed = build_index(vec![Rule::new("cake", "pie")]);
        let engine = Engine::from_indexed(indexed, EngineConfig::new("unused.txt", "unused.idx"));

        assert_eq!(engine.transform("cake"), "pie");
        assert_eq!(engine.transform("cake"), "pie");
        assert_eq!(engine.cached_results(), 1);
    }

    #[test]
    fn test_no_result_cache() {
        let indexed = build_index(vec![Rule::new("cake", "pie")]);
        let config = EngineConfig::new("unused.txt", "unused.idx").no_result_cache();
        let engine = Engine::from_indexed(indexed, config);

        assert_eq!(engine.transform("cake"), "pie");
        assert_eq!(engine.cached_results(), 0);
    }

    #[test]
    fn test_hot_reload() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("list.txt");
        fs::write(&rules, "cake => pie\n").unwrap();
        set_mtime(&rules, SystemTime::now() - Duration::from_secs(120));

        let engine = Engine::initialize(&rules, dir.path().join("list.idx")).unwrap();
        assert_eq!(engine.transform("cake"), "pie");
        let before = engine.snapshot();

        fs::write(&rules, "cake => tart\n").unwrap();
        set_mtime(&rules, SystemTime::now() + Duration::from_secs(60));
        engine.reload().unwrap();

        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.transform("cake"), "tart");
        assert_eq!(engine.stats().source, IndexSource::Rebuilt);
        // readers holding the old snapshot still see the old rules
        assert_eq!(apply("cake", &before.indexed.rules, &before.indexed.index), "pie");
    }

    #[test]
    fn test_failed_reload_keeps_old_index() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("list.txt");
        fs::write(&rules, "cake => pie\n").unwrap();

        let engine = Engine::initialize(&rules, dir.path().join("list.idx")).unwrap();
        fs::remove_file(&rules).unwrap();

        assert!(engine.reload().is_err());
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.transform("cake"), "pie");
    }

    #[test]
    fn test_results_memoized_on_old_index_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("list.txt");
        fs::write(&rules, "cake => pie\n").unwrap();
        set_mtime(&rules, SystemTime::now() - Duration::from_secs(120));

        let engine = Engine::initialize(&rules, dir.path().join("list.idx")).unwrap();
        let before = engine.snapshot();

        fs::write(&rules, "cake => tart\n").unwrap();
        set_mtime(&rules, SystemTime::now() + Duration::from_secs(60));
        engine.reload().unwrap();

        // a transform that started before the reload finishes on the old index
        assert_eq!(before.transform("cake"), "pie");
        assert_eq!(engine.transform("cake"), "tart");
        assert_eq!(engine.cached_results(), 1);
    }

    #[test]
    fn test_concurrent_transform_across_reload() {
        use std::sync::atomic::AtomicBool;

        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("list.txt");
        fs::write(&rules, "cake => pie\n").unwrap();
        set_mtime(&rules, SystemTime::now() - Duration::from_secs(120));

        let engine = Arc::new(Engine::initialize(&rules, dir.path().join("list.idx")).unwrap());
        let stop = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                let stop = stop.clone();
                std::thread::spawn(move || {
                    let mut i = 0usize;
                    while !stop.load(Ordering::SeqCst) {
                        let out = engine.transform(&format!("cake {}", i % 50));
                        assert!(out.starts_with("pie") || out.starts_with("tart"));
                        i += 1;
                    }
                })
            })
            .collect();

        std::thread::sleep(Duration::from_millis(20));
        fs::write(&rules, "cake => tart\n").unwrap();
        set_mtime(&rules, SystemTime::now() + Duration::from_secs(60));
        engine.reload().unwrap();
        std::thread::sleep(Duration::from_millis(20));

        stop.store(true, Ordering::SeqCst);
        for reader in readers {
            reader.join().unwrap();
        }

        for i in 0..50 {
            assert_eq!(engine.transform(&format!("cake {}", i)), format!("tart {}", i));
        }
    }

    #[test]
    fn test_long_input_not_memoized() {
        let indexed = build_index(vec![Rule::new("cake", "pie")]);
        let engine = Engine::from_indexed(indexed, EngineConfig::new("unused.txt", "unused.idx"));

        let long = format!("cake {}", "x".repeat(MAX_CACHED_TEXT_LEN));
        assert!(engine.transform(&long).starts_with("pie "));
        assert_eq!(engine.cached_results(), 0);

        engine.transform("cake");
        assert_eq!(engine.cached_results(), 1);
    }

    #[test]
    fn test_from_indexed_reports_memory_source() {
        let indexed = build_index(vec![Rule::new("cake", "pie")]);
        let engine = Engine::from_indexed(indexed, EngineConfig::new("unused.txt", "unused.idx"));
        assert_eq!(engine.stats().source, IndexSource::Memory);
    }
}
