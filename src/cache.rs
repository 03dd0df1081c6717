//! Analysis cache
//!
//! A single JSON file mapping a cache key to precomputed analyses.
//! `refresh` reads the whole file, merges the new entries, renames the
//! old file to a timestamped backup and writes the merged map in its
//! place. Single writer only: two concurrent refreshes can lose entries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{AnalysisSet, ConditionAnalyses, LevelAnalyses};
use crate::{Error, Result};

/// Default cache location.
pub const DEFAULT_CACHE_PATH: &str = "./analyses_caches/meta_learning_analyses_cache.json";

/// Timestamp format of backup file names.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedAnalysis {
    /// One aggregated run collection
    Analysis(AnalysisSet),
    /// Per-condition aggregation of baseline runs
    Conditions(ConditionAnalyses<AnalysisSet>),
    /// Per-level, per-condition aggregation of query-modulated runs
    Modulated(LevelAnalyses),
}

/// Cache contents.
pub type CacheMap = BTreeMap<String, CachedAnalysis>;

/// File-backed analysis cache.
#[derive(Debug, Clone)]
pub struct AnalysisCache {
    path: PathBuf,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PATH)
    }
}

impl AnalysisCache {
    /// Cache stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache; a missing file is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the file exists but cannot be parsed.
    pub fn load(&self) -> Result<CacheMap> {
        if !self.path.exists() {
            return Ok(CacheMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| {
            Error::CacheError(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    /// Merge `new_values` into the cache and persist it.
    ///
    /// The previous file, if any, is kept as a timestamped backup.
    /// Returns the merged contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read, backed up or written.
    pub fn refresh(&self, new_values: CacheMap) -> Result<CacheMap> {
        let mut cache = self.load()?;
        cache.extend(new_values);

        if self.path.exists() {
            let backup = self.free_backup_path(Local::now());
            fs::rename(&self.path, &backup)?;
            debug!(backup = %backup.display(), "backed up analysis cache");
        } else if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, serde_json::to_vec(&cache)?)?;
        Ok(cache)
    }

    /// Backup path for a given time: `<stem>_YYYY-MM-DD_HH-MM-SS.<ext>`.
    #[must_use]
    pub fn backup_path(&self, at: DateTime<Local>) -> PathBuf {
        self.backup_path_with_suffix(at, None)
    }

    fn backup_path_with_suffix(&self, at: DateTime<Local>, suffix: Option<usize>) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map_or_else(|| "cache".into(), |s| s.to_string_lossy());
        let timestamp = at.format(BACKUP_TIMESTAMP_FORMAT);
        let mut name = match suffix {
            Some(n) => format!("{stem}_{timestamp}_{n}"),
            None => format!("{stem}_{timestamp}"),
        };
        if let Some(ext) = self.path.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        self.path.with_file_name(name)
    }

    /// Backups made within the same second get a numeric suffix.
    fn free_backup_path(&self, at: DateTime<Local>) -> PathBuf {
        let mut candidate = self.backup_path(at);
        let mut n = 1;
        while candidate.exists() {
            candidate = self.backup_path_with_suffix(at, Some(n));
            n += 1;
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_backup_path_format() {
        let cache = AnalysisCache::new("/tmp/caches/analyses_cache.json");
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            cache.backup_path(at),
            PathBuf::from("/tmp/caches/analyses_cache_2024-03-05_14-07-09.json")
        );
    }

    #[test]
    fn test_missing_file_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path().join("nested").join("cache.json"));
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "not json").unwrap();
        let err = AnalysisCache::new(path).load().unwrap_err();
        assert!(matches!(err, Error::CacheError(_)));
    }
}
