//! Modifier errors

use std::path::PathBuf;

/// Errors raised while building or applying template edits
#[derive(Debug, thiserror::Error)]
pub enum ModifierError {
    /// A replacement marker is absent from the compiled template
    #[error("{message} (sample {sample}, marker {marker:?})")]
    TemplateDrift {
        /// Sample whose edits failed
        sample: String,
        /// Literal marker text
        marker: &'static str,
        /// Failure message supplied by the modifier
        message: String,
    },

    /// Marker name outside the known set
    #[error("unknown template marker: {0}")]
    UnknownMarker(String),

    /// Declarative modifier entry cannot be built
    #[error("invalid modifier spec {kind}: {reason}")]
    InvalidSpec {
        /// Modifier kind
        kind: &'static str,
        /// What is wrong
        reason: String,
    },

    /// Template file could not be read
    #[error("failed to read template {path}: {source}")]
    Io {
        /// Template path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ModifierError {
    /// Name of the sample the error is about, if any
    #[must_use]
    pub fn sample(&self) -> Option<&str> {
        match self {
            Self::TemplateDrift { sample, .. } => Some(sample),
            _ => None,
        }
    }
}
