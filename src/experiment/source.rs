//! Run sources - where run listings and histories come from
//!
//! The tracking service is reached through the [`RunSource`] trait. The
//! crate ships two implementations: the in-memory
//! [`super::ExperimentStore`] and [`DirectoryRunSource`], a directory
//! export with a JSON manifest and one Parquet history per run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{RunHistory, RunRecord};
use crate::{storage, Result};

/// Manifest file listing every exported run.
pub const MANIFEST_FILE: &str = "runs.json";

/// Access to run listings and sample histories.
///
/// Calls are blocking, one per listing or run.
pub trait RunSource {
    /// List the runs of a project (`entity/project`).
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    fn runs(&self, project: &str) -> Result<Vec<RunRecord>>;

    /// Fetch the sample history of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be fetched.
    fn history(&self, run: &RunRecord) -> Result<RunHistory>;
}

/// Directory export of runs.
///
/// ```text
/// <root>/runs.json          [RunRecord, ...]
/// <root>/<run_id>.parquet   one history per run
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryRunSource {
    root: PathBuf,
}

impl DirectoryRunSource {
    /// Open an export directory (created lazily on first write).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Export directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn history_path(&self, run_id: &str) -> PathBuf {
        self.root.join(format!("{run_id}.parquet"))
    }

    fn manifest(&self) -> Result<Vec<RunRecord>> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Add or replace a run and its history in the export.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest or the Parquet file cannot be written.
    pub fn write_run(&self, run: &RunRecord, history: &RunHistory) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        storage::save_parquet(self.history_path(run.run_id()), history.batch())?;

        let mut manifest = self.manifest()?;
        manifest.retain(|existing| existing.run_id() != run.run_id());
        manifest.push(run.clone());
        fs::write(self.manifest_path(), serde_json::to_string_pretty(&manifest)?)?;

        debug!(run = run.name(), root = %self.root.display(), "exported run");
        Ok(())
    }
}

impl RunSource for DirectoryRunSource {
    fn runs(&self, project: &str) -> Result<Vec<RunRecord>> {
        Ok(self
            .manifest()?
            .into_iter()
            .filter(|run| run.project() == project)
            .collect())
    }

    fn history(&self, run: &RunRecord) -> Result<RunHistory> {
        let batch = storage::load_parquet(self.history_path(run.run_id()))?;
        RunHistory::try_new(run.name(), batch)
    }
}
