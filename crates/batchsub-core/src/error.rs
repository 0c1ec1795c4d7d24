//! Error types for batchsub core
//!
//! Provides [`SubmitError`], the umbrella for every failure that stops a run:
//! - Catalog and sample-state errors
//! - Splitting resolution errors
//! - Template drift and modifier configuration errors
//! - Routing, ceiling and backend errors

use std::path::PathBuf;

use batchsub_modifier::ModifierError;
use batchsub_sample::SampleError;
use batchsub_splitting::SplittingError;

use crate::types::Backend;

/// Main batchsub error type
///
/// Nothing here is retried inside the core.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Catalog or sample-state error
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// Splitting could not be resolved
    #[error(transparent)]
    Splitting(#[from] SplittingError),

    /// Template drift or bad modifier configuration
    #[error(transparent)]
    Modifier(#[from] ModifierError),

    /// Backend override outside the recognized values
    #[error("invalid backend override {0:?}: expected none, grid or local")]
    InvalidOverride(String),

    /// Execution mode outside the recognized values
    #[error("invalid execution mode {0:?}: expected build, dry-run or submit")]
    InvalidMode(String),

    /// Run configuration is inconsistent
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// Run configuration is not valid TOML for this schema
    #[error("failed to parse run configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Sample reached submission without a resolved splitting
    #[error("sample {0} has no resolved splitting")]
    Unsplit(String),

    /// Sample would produce more jobs than its backend accepts
    #[error("sample {sample} needs {jobs} jobs on {backend}, limit is {limit}")]
    JobCeilingExceeded {
        /// Sample name
        sample: String,
        /// Backend it routes to
        backend: Backend,
        /// Estimated job count
        jobs: u64,
        /// Configured ceiling
        limit: u64,
    },

    /// Backend submitter failed
    #[error("{backend} submission failed: {message}")]
    Backend {
        /// Backend that failed
        backend: Backend,
        /// What went wrong
        message: String,
    },

    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Manifest serialization failure
    #[error("manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl SubmitError {
    /// Create a backend error
    #[inline]
    pub fn backend(backend: Backend, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
        }
    }

    /// Create an I/O error for a path
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the sample the error is about, if any
    #[must_use]
    pub fn sample(&self) -> Option<&str> {
        match self {
            Self::Sample(e) => e.sample(),
            Self::Splitting(e) => e.sample(),
            Self::Modifier(e) => e.sample(),
            Self::Unsplit(sample) | Self::JobCeilingExceeded { sample, .. } => Some(sample),
            _ => None,
        }
    }

    /// Check if the error comes from how the run was invoked or configured
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOverride(_)
                | Self::InvalidMode(_)
                | Self::InvalidConfig(_)
                | Self::ConfigParse(_)
                | Self::Splitting(SplittingError::UnknownJobType(_))
                | Self::Sample(SampleError::UnknownSelector(_) | SampleError::InvalidPattern { .. })
                | Self::Modifier(ModifierError::InvalidSpec { .. } | ModifierError::UnknownMarker(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_reported() {
        let err = SubmitError::JobCeilingExceeded {
            sample: "qcdht0500".to_string(),
            backend: Backend::Grid,
            jobs: 12_000,
            limit: 10_000,
        };
        assert_eq!(err.sample(), Some("qcdht0500"));
        assert_eq!(
            err.to_string(),
            "sample qcdht0500 needs 12000 jobs on grid, limit is 10000"
        );

        let err: SubmitError = SplittingError::MissingEntry {
            job_type: "trackmover".to_string(),
            sample: "ttbar_2017".to_string(),
        }
        .into();
        assert_eq!(err.sample(), Some("ttbar_2017"));
    }

    #[test]
    fn caller_errors() {
        assert!(SubmitError::InvalidOverride("both".to_string()).is_caller_error());
        assert!(
            SubmitError::from(SplittingError::UnknownJobType("x".to_string())).is_caller_error()
        );
        assert!(!SubmitError::Unsplit("ttbar".to_string()).is_caller_error());
        assert!(!SubmitError::backend(Backend::Pool, "scheduler down").is_caller_error());
    }
}
