//! Condition buckets
//!
//! Runs are grouped by the query dimension they were trained on (color,
//! shape, texture) plus a combined bucket holding every run. Query
//! modulated runs are additionally keyed by replication level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::{AnalysisSet, Aggregator};
use crate::experiment::{Dimension, RunDescriptor, RunRecord, RunSource};
use crate::Result;

/// Replication levels (conv layer of the modulation) in the benchmark.
pub const REPLICATION_LEVELS: [u32; 4] = [1, 2, 3, 4];

/// One of the four condition buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Color-query runs
    Color,
    /// Shape-query runs
    Shape,
    /// Texture-query runs
    Texture,
    /// All runs
    Combined,
}

impl Condition {
    /// All conditions in index order.
    pub const ALL: [Self; 4] = [Self::Color, Self::Shape, Self::Texture, Self::Combined];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Shape => "shape",
            Self::Texture => "texture",
            Self::Combined => "combined",
        }
    }

    /// Name with a leading capital, used as panel title.
    #[must_use]
    pub fn title(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

impl From<Dimension> for Condition {
    fn from(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Color => Self::Color,
            Dimension::Shape => Self::Shape,
            Dimension::Texture => Self::Texture,
        }
    }
}

/// Per-level aggregations of query-modulated runs; a bucket without runs is `None`.
pub type LevelAnalyses = BTreeMap<u32, ConditionAnalyses<Option<AnalysisSet>>>;

/// A value per condition bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionAnalyses<T> {
    /// Color bucket
    pub color: T,
    /// Shape bucket
    pub shape: T,
    /// Texture bucket
    pub texture: T,
    /// Every run
    pub combined: T,
}

impl<T> ConditionAnalyses<T> {
    /// Value for a condition.
    #[must_use]
    pub const fn get(&self, condition: Condition) -> &T {
        match condition {
            Condition::Color => &self.color,
            Condition::Shape => &self.shape,
            Condition::Texture => &self.texture,
            Condition::Combined => &self.combined,
        }
    }

    /// Mutable value for a condition.
    pub fn get_mut(&mut self, condition: Condition) -> &mut T {
        match condition {
            Condition::Color => &mut self.color,
            Condition::Shape => &mut self.shape,
            Condition::Texture => &mut self.texture,
            Condition::Combined => &mut self.combined,
        }
    }

    /// Fallible map over every bucket, in condition order.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map<U>(&self, mut f: impl FnMut(Condition, &T) -> Result<U>) -> Result<ConditionAnalyses<U>> {
        Ok(ConditionAnalyses {
            color: f(Condition::Color, &self.color)?,
            shape: f(Condition::Shape, &self.shape)?,
            texture: f(Condition::Texture, &self.texture)?,
            combined: f(Condition::Combined, &self.combined)?,
        })
    }
}

fn descriptor_of(run: &RunRecord, modulated: bool) -> Result<RunDescriptor> {
    if let Some(descriptor) = run.descriptor() {
        return Ok(descriptor);
    }
    if modulated {
        RunDescriptor::parse_modulated(run.description())
    } else {
        RunDescriptor::parse_baseline(run.description())
    }
}

/// Bucket baseline runs by dimension, keeping replications below `max_rep`.
///
/// # Errors
///
/// Returns `InvalidRunDescriptor` for a run without a decodable identifier.
pub fn runs_by_dimension(
    runs: Vec<RunRecord>,
    max_rep: u32,
) -> Result<ConditionAnalyses<Vec<RunRecord>>> {
    let mut buckets = ConditionAnalyses::<Vec<RunRecord>>::default();
    for run in runs {
        let descriptor = descriptor_of(&run, false)?;
        if descriptor.replication() < max_rep {
            buckets.get_mut(descriptor.dimension().into()).push(run.clone());
            buckets.combined.push(run);
        }
    }
    Ok(buckets)
}

/// Bucket query-modulated runs by replication level, then dimension.
///
/// Levels `1..=4` are always present, possibly empty.
///
/// # Errors
///
/// Returns `InvalidRunDescriptor` for a run without a decodable `L-XXXX`
/// identifier.
pub fn query_modulated_runs_by_dimension(
    runs: Vec<RunRecord>,
    max_rep: u32,
) -> Result<BTreeMap<u32, ConditionAnalyses<Vec<RunRecord>>>> {
    let mut levels: BTreeMap<u32, ConditionAnalyses<Vec<RunRecord>>> = REPLICATION_LEVELS
        .iter()
        .map(|&level| (level, ConditionAnalyses::default()))
        .collect();

    for run in runs {
        let descriptor = descriptor_of(&run, true)?;
        let Some(level) = descriptor.level() else {
            continue;
        };
        if descriptor.replication() < max_rep {
            let buckets = levels.entry(level).or_default();
            buckets.get_mut(descriptor.dimension().into()).push(run.clone());
            buckets.combined.push(run);
        }
    }
    Ok(levels)
}

impl Aggregator {
    /// Aggregate each condition bucket separately.
    ///
    /// # Errors
    ///
    /// Fails on the first bucket that fails to aggregate.
    pub fn aggregate_conditions<S: RunSource>(
        &self,
        source: &S,
        buckets: &ConditionAnalyses<Vec<RunRecord>>,
    ) -> Result<ConditionAnalyses<AnalysisSet>> {
        buckets.try_map(|_, runs| self.aggregate(source, runs))
    }

    /// Aggregate each replication level's condition buckets.
    ///
    /// Levels without any run are left out; empty buckets of the other
    /// levels are `None`.
    ///
    /// # Errors
    ///
    /// Fails on the first bucket that fails to aggregate.
    pub fn aggregate_levels<S: RunSource>(
        &self,
        source: &S,
        levels: &BTreeMap<u32, ConditionAnalyses<Vec<RunRecord>>>,
    ) -> Result<LevelAnalyses> {
        levels
            .iter()
            .filter(|(_, buckets)| !buckets.combined.is_empty())
            .map(|(&level, buckets)| {
                let analyses = buckets.try_map(|condition, runs| {
                    if runs.is_empty() {
                        debug!(level, condition = condition.as_str(), "no runs in bucket");
                        return Ok(None);
                    }
                    self.aggregate(source, runs).map(Some)
                })?;
                Ok((level, analyses))
            })
            .collect()
    }
}
