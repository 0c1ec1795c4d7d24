//! Core types for batchsub
//!
//! Backends, the run-wide override, execution modes and the batch unit handed
//! to a submitter.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use batchsub_sample::Sample;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::ResolvedKwargs;
use crate::error::SubmitError;

/// Execution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Wide-area grid submission service
    Grid,
    /// Directly managed local compute pool
    Pool,
}

impl Backend {
    /// Backends in submission order
    pub const ALL: [Backend; 2] = [Backend::Grid, Backend::Pool];

    /// Default job ceiling per sample (`None` is unlimited)
    #[inline]
    #[must_use]
    pub const fn default_max_jobs(self) -> Option<u64> {
        match self {
            Self::Grid => Some(10_000),
            Self::Pool => None,
        }
    }

    /// Name used in configuration and paths
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Pool => "pool",
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-wide backend override
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackendOverride {
    /// Follow each sample's affinity
    #[default]
    None,
    /// Send every sample to the grid
    ForceGrid,
    /// Send every sample to the local pool
    ForceLocal,
}

impl BackendOverride {
    /// Backend every sample is forced to, if any
    #[inline]
    #[must_use]
    pub const fn forced(self) -> Option<Backend> {
        match self {
            Self::None => None,
            Self::ForceGrid => Some(Backend::Grid),
            Self::ForceLocal => Some(Backend::Pool),
        }
    }

    /// Canonical configuration name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ForceGrid => "grid",
            Self::ForceLocal => "local",
        }
    }
}

impl Display for BackendOverride {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendOverride {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "grid" | "crab" | "force-grid" => Ok(Self::ForceGrid),
            "local" | "pool" | "condor" | "force-local" => Ok(Self::ForceLocal),
            other => Err(SubmitError::InvalidOverride(other.to_string())),
        }
    }
}

impl TryFrom<String> for BackendOverride {
    type Error = SubmitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BackendOverride> for String {
    fn from(value: BackendOverride) -> Self {
        value.as_str().to_string()
    }
}

/// What a run does once every sample is validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Build and print per-batch summaries
    #[default]
    Build,
    /// Print the per-backend routing only
    DryRun,
    /// Hand each non-empty batch to its backend submitter
    Submit,
}

impl ExecutionMode {
    /// Check if the mode may touch backends
    #[inline]
    #[must_use]
    pub const fn submits(self) -> bool {
        matches!(self, Self::Submit)
    }
}

impl FromStr for ExecutionMode {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Self::Build),
            "testing" | "dry-run" | "dryrun" => Ok(Self::DryRun),
            "submit" => Ok(Self::Submit),
            other => Err(SubmitError::InvalidMode(other.to_string())),
        }
    }
}

/// Which outputs a job stages out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOut {
    /// Every output file
    All,
    /// The backend's default selection
    #[default]
    Selected,
}

/// Samples bound for one backend with their resolved keywords
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Batch name shared by every backend of the run
    pub batch_name: String,
    /// Target backend
    pub backend: Backend,
    /// Samples in routing order
    pub samples: Vec<Sample>,
    /// Keywords for the backend submitter
    pub kwargs: ResolvedKwargs,
}

impl Batch {
    /// Check if the batch has no samples
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample names in order
    #[must_use]
    pub fn sample_names(&self) -> Vec<&str> {
        self.samples.iter().map(Sample::name).collect()
    }

    /// Total estimated jobs, counting samples with unknown sizes as zero
    #[must_use]
    pub fn estimated_jobs(&self) -> u64 {
        self.samples
            .iter()
            .filter_map(Sample::estimated_jobs)
            .sum()
    }
}

/// Result of one backend submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Identifier assigned to this submission
    pub batch_id: Ulid,
    /// Batch name
    pub batch_name: String,
    /// Backend submitted to
    pub backend: Backend,
    /// Submitted sample names
    pub samples: Vec<String>,
    /// Estimated job count
    pub jobs: u64,
    /// Where artifacts were written, for file-based submitters
    pub location: Option<PathBuf>,
}

impl SubmissionReceipt {
    /// Create new receipt for a batch
    #[must_use]
    pub fn for_batch(batch_name: &str, backend: Backend, samples: &[Sample]) -> Self {
        Self {
            batch_id: Ulid::new(),
            batch_name: batch_name.to_string(),
            backend,
            samples: samples.iter().map(|s| s.name().to_string()).collect(),
            jobs: samples.iter().filter_map(Sample::estimated_jobs).sum(),
            location: None,
        }
    }

    /// With artifact location
    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_aliases() {
        for (text, expected) in [
            ("none", BackendOverride::None),
            ("grid", BackendOverride::ForceGrid),
            ("crab", BackendOverride::ForceGrid),
            ("local", BackendOverride::ForceLocal),
            ("condor", BackendOverride::ForceLocal),
            ("pool", BackendOverride::ForceLocal),
        ] {
            assert_eq!(text.parse::<BackendOverride>().unwrap(), expected);
        }
        assert!(matches!(
            "both".parse::<BackendOverride>(),
            Err(SubmitError::InvalidOverride(_))
        ));
    }

    #[test]
    fn mode_tokens() {
        assert_eq!("testing".parse::<ExecutionMode>().unwrap(), ExecutionMode::DryRun);
        assert_eq!("dry-run".parse::<ExecutionMode>().unwrap(), ExecutionMode::DryRun);
        assert_eq!("submit".parse::<ExecutionMode>().unwrap(), ExecutionMode::Submit);
        assert_eq!(ExecutionMode::default(), ExecutionMode::Build);
        assert!(ExecutionMode::Submit.submits());
        assert!(!ExecutionMode::DryRun.submits());
        assert!("now".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn backend_ceilings() {
        assert_eq!(Backend::Grid.default_max_jobs(), Some(10_000));
        assert_eq!(Backend::Pool.default_max_jobs(), None);
        assert_eq!(Backend::ALL, [Backend::Grid, Backend::Pool]);
    }
}
