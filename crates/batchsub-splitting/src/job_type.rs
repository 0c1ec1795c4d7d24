//! Job types and their heuristic classes

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::SplittingError;

/// Heuristic family a job type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobClass {
    /// Remote-read heavy: split by files on the local pool, by events on the grid.
    /// Its table is exhaustive.
    IoSensitive,
    /// Histogram or summary-tree production: always split by files
    FileGranular,
    /// Primary skim production: chunk sizes from per-sample event rates
    RateBased,
    /// Anything else: split by files with a run-wide default
    Uniform,
}

/// Declared kind of batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobType {
    /// Track-moving efficiency study
    TrackMover,
    /// Histogram production
    Histos,
    /// Summary-tree production
    MiniTree,
    /// Primary skim (ntuple) production
    Ntuple,
    /// Generic job with a configurable files-per-job
    Default,
}

impl JobType {
    /// All recognized job types
    pub const ALL: [JobType; 5] = [
        JobType::TrackMover,
        JobType::Histos,
        JobType::MiniTree,
        JobType::Ntuple,
        JobType::Default,
    ];

    /// Heuristic class
    #[inline]
    #[must_use]
    pub fn class(&self) -> JobClass {
        match self {
            Self::TrackMover => JobClass::IoSensitive,
            Self::Histos | Self::MiniTree => JobClass::FileGranular,
            Self::Ntuple => JobClass::RateBased,
            Self::Default => JobClass::Uniform,
        }
    }

    /// Name used in configuration
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrackMover => "trackmover",
            Self::Histos => "histos",
            Self::MiniTree => "minitree",
            Self::Ntuple => "ntuple",
            Self::Default => "default",
        }
    }
}

impl Display for JobType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = SplittingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|jt| jt.as_str() == s)
            .ok_or_else(|| SplittingError::UnknownJobType(s.to_string()))
    }
}
