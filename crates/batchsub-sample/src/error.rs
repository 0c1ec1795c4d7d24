//! Error types for the sample model and catalog

use std::path::PathBuf;

/// Errors raised while building, loading or querying samples
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// Two catalog records share a name
    #[error("duplicate sample name: {0}")]
    DuplicateSample(String),

    /// Selector named a sample the catalog does not know
    #[error("unknown sample: {0}")]
    UnknownSample(String),

    /// Group references a missing sample, or selector names no group or sample
    #[error("unknown sample or group: {0}")]
    UnknownSelector(String),

    /// Sample name cannot be used as a single file-name component
    #[error("invalid sample name {name:?}: {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Catalog record is inconsistent with its declared kind
    #[error("invalid catalog record {sample}: {reason}")]
    InvalidRecord {
        /// Sample name
        sample: String,
        /// What is wrong with it
        reason: String,
    },

    /// Sample has no variant with the requested name
    #[error("sample {sample} has no dataset variant {dataset}")]
    UnknownDataset {
        /// Sample name
        sample: String,
        /// Requested variant
        dataset: String,
    },

    /// A lumi filter may only be attached to recorded data
    #[error("sample {0} is simulation and cannot carry a lumi filter")]
    LumiFilterOnSimulation(String),

    /// Chunk sizes must be at least one
    #[error("invalid splitting for {sample}: events_per={events_per}, files_per={files_per}")]
    InvalidSplitting {
        /// Sample name
        sample: String,
        /// Offending events per job
        events_per: u64,
        /// Offending files per job
        files_per: u64,
    },

    /// Selection pattern is not a valid regular expression
    #[error("invalid selection pattern {pattern}: {source}")]
    InvalidPattern {
        /// Pattern text (without the `re:` prefix)
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Catalog file has an extension we cannot parse
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Catalog file could not be read
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Catalog path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Invalid YAML
    #[error("invalid YAML catalog: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Invalid JSON
    #[error("invalid JSON catalog: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl SampleError {
    /// Name of the sample the error is about, if any
    #[must_use]
    pub fn sample(&self) -> Option<&str> {
        match self {
            Self::DuplicateSample(name)
            | Self::UnknownSample(name)
            | Self::LumiFilterOnSimulation(name) => Some(name),
            Self::UnknownDataset { sample, .. }
            | Self::InvalidSplitting { sample, .. }
            | Self::InvalidRecord { sample, .. } => Some(sample),
            Self::InvalidName { name, .. } => Some(name),
            _ => None,
        }
    }
}
