//! Cache freshness, load and save.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use super::reader::CacheReader;
use super::writer::CacheWriter;
use crate::index::IndexedRules;
use crate::Result;

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Check whether the cache can stand in for the rule file.
///
/// True iff both files exist and the cache was modified strictly after the
/// rule file.
pub fn is_fresh(rule_path: &Path, cache_path: &Path) -> bool {
    match (modified(cache_path), modified(rule_path)) {
        (Some(cache), Some(rules)) => cache > rules,
        _ => false,
    }
}

/// Load a fresh cache, or `None` on a miss.
///
/// A stale, missing or undecodable cache is a miss; decode errors are
/// logged and never returned.
pub fn load(rule_path: &Path, cache_path: &Path) -> Option<IndexedRules> {
    if !is_fresh(rule_path, cache_path) {
        log::debug!("Cache {:?} missing or older than {:?}", cache_path, rule_path);
        return None;
    }

    match CacheReader::open(cache_path) {
        Ok(indexed) => {
            log::info!(
                "Loaded index cache {:?}: {} rules, {} keywords",
                cache_path,
                indexed.rules.len(),
                indexed.index.len()
            );
            Some(indexed)
        }
        Err(e) => {
            log::warn!("Corrupted index cache {:?}, rebuilding: {}", cache_path, e);
            None
        }
    }
}

/// Persist `indexed` to `cache_path`.
///
/// Writes to a temporary file next to the target and renames it into place,
/// so readers never observe a half-written cache.
pub fn save(cache_path: &Path, indexed: &IndexedRules, compress: bool) -> Result<()> {
    let data = CacheWriter::new().compressed(compress).write(indexed)?;

    let dir = match cache_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(&data)?;
    temp.as_file().sync_all()?;
    temp.persist(cache_path).map_err(|e| e.error)?;

    log::debug!("Saved index cache {:?} ({} bytes)", cache_path, data.len());
    Ok(())
}
