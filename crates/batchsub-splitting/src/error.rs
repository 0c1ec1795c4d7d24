//! Splitting errors

use batchsub_sample::SampleError;

/// Errors raised while resolving splittings
///
/// Every variant is fatal for the run: nothing is submitted for a sample set
/// containing an unresolved sample.
#[derive(Debug, thiserror::Error)]
pub enum SplittingError {
    /// Job type outside the recognized set
    #[error("don't know anything about job type {0}")]
    UnknownJobType(String),

    /// Sample absent from a table declared exhaustive
    #[error("job type {job_type} has no splitting entry for sample {sample}")]
    MissingEntry {
        /// Job type name
        job_type: String,
        /// Sample name
        sample: String,
    },

    /// Table entry unusable for its job type
    #[error("invalid splitting entry for {sample} in {job_type}: {reason}")]
    InvalidEntry {
        /// Job type name
        job_type: String,
        /// Sample name
        sample: String,
        /// What is wrong
        reason: String,
    },

    /// Sample-level failure (missing dataset variant, bad chunk size, lumi filter)
    #[error(transparent)]
    Sample(#[from] SampleError),
}

impl SplittingError {
    /// Name of the sample the error is about, if any
    #[must_use]
    pub fn sample(&self) -> Option<&str> {
        match self {
            Self::UnknownJobType(_) => None,
            Self::MissingEntry { sample, .. } | Self::InvalidEntry { sample, .. } => Some(sample),
            Self::Sample(e) => e.sample(),
        }
    }
}
