//! Dataset variants, run ranges and lumi filters

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Variant selected when nothing else is requested
pub const DEFAULT_DATASET: &str = "main";

/// One named file catalog a sample can be processed from
///
/// Counts are optional; they only feed job-count estimates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetVariant {
    /// Catalog identifier (dataset path or listing name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Number of input files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfiles: Option<u64>,
    /// Number of events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nevents: Option<u64>,
}

impl DatasetVariant {
    /// Create an empty variant
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With catalog identifier
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// With file count
    #[inline]
    #[must_use]
    pub fn with_files(mut self, nfiles: u64) -> Self {
        self.nfiles = Some(nfiles);
        self
    }

    /// With event count
    #[inline]
    #[must_use]
    pub fn with_events(mut self, nevents: u64) -> Self {
        self.nevents = Some(nevents);
        self
    }
}

/// Inclusive run range of a recorded-data sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunRange {
    /// First run
    pub first: u32,
    /// Last run
    pub last: u32,
}

impl RunRange {
    /// Create new range
    #[inline]
    #[must_use]
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// Check whether a run falls in the range
    #[inline]
    #[must_use]
    pub fn contains(&self, run: u32) -> bool {
        (self.first..=self.last).contains(&run)
    }
}

/// Reference to a certified run/lumi-section list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LumiFilter(PathBuf);

impl LumiFilter {
    /// Create from a path
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Underlying path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Display for LumiFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for LumiFilter {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_range_inclusive() {
        let r = RunRange::new(297_046, 299_329);
        assert!(r.contains(297_046));
        assert!(r.contains(299_329));
        assert!(!r.contains(299_330));
    }

    #[test]
    fn variant_builder() {
        let v = DatasetVariant::new().with_files(120).with_events(4_000_000);
        assert_eq!(v.nfiles, Some(120));
        assert_eq!(v.nevents, Some(4_000_000));
        assert!(v.path.is_none());
    }

    #[test]
    fn lumi_filter_display() {
        let f = LumiFilter::from("jsons/ana_2017p8_1pc.json");
        assert_eq!(f.to_string(), "jsons/ana_2017p8_1pc.json");
    }
}
