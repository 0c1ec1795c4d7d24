//! The sample record
//!
//! A [`Sample`] is built once from a catalog and is immutable apart from
//! its splitting fields, its selected dataset variant and its lumi filter.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetVariant, LumiFilter, RunRange, DEFAULT_DATASET};
use crate::error::SampleError;

/// Where the events of a sample come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Simulated events
    Simulation {
        /// Total generated events
        nevents: u64,
    },
    /// Recorded collision data
    Recorded {
        /// Runs covered, when known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        runs: Option<RunRange>,
    },
}

/// Unit a job's input is chunked by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitBy {
    /// Whole input files
    #[default]
    Files,
    /// Bounded event ranges
    Events,
}

impl SplitBy {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Events => "events",
        }
    }
}

impl Display for SplitBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(Self::Files),
            "events" => Ok(Self::Events),
            other => Err(format!("unknown split_by: {other}")),
        }
    }
}

/// Resolved splitting granularity of one sample
///
/// Both chunk sizes are always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Splitting {
    /// Input unit
    pub split_by: SplitBy,
    /// Events per job when splitting by events
    pub events_per: u64,
    /// Files per job when splitting by files
    pub files_per: u64,
}

impl Splitting {
    /// Create a splitting, rejecting zero chunk sizes
    ///
    /// # Errors
    /// `SampleError::InvalidSplitting` if either chunk size is zero
    pub fn new(
        sample: &str,
        split_by: SplitBy,
        events_per: u64,
        files_per: u64,
    ) -> Result<Self, SampleError> {
        let splitting = Self {
            split_by,
            events_per,
            files_per,
        };
        splitting.validate(sample)?;
        Ok(splitting)
    }

    /// Check the chunk-size invariant
    ///
    /// # Errors
    /// `SampleError::InvalidSplitting` if either chunk size is zero
    pub fn validate(&self, sample: &str) -> Result<(), SampleError> {
        if self.events_per == 0 || self.files_per == 0 {
            return Err(SampleError::InvalidSplitting {
                sample: sample.to_string(),
                events_per: self.events_per,
                files_per: self.files_per,
            });
        }
        Ok(())
    }
}

impl Display for Splitting {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.split_by {
            SplitBy::Files => write!(f, "files x{}", self.files_per),
            SplitBy::Events => write!(f, "events x{}", self.events_per),
        }
    }
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

/// One dataset descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SampleRecord")]
pub struct Sample {
    name: String,
    #[serde(flatten)]
    provenance: Provenance,
    /// Prefers the local-pool backend when true
    condor: bool,
    datasets: IndexMap<String, DatasetVariant>,
    #[serde(rename = "dataset")]
    curr_dataset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    splitting: Option<Splitting>,
    #[serde(rename = "json", skip_serializing_if = "Option::is_none")]
    lumi_filter: Option<LumiFilter>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RecordKind {
    Simulation,
    Recorded,
}

/// On-disk catalog record; unknown keys are rejected
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SampleRecord {
    name: String,
    kind: RecordKind,
    #[serde(default)]
    nevents: Option<u64>,
    #[serde(default)]
    runs: Option<RunRange>,
    #[serde(default)]
    condor: bool,
    #[serde(default)]
    datasets: IndexMap<String, DatasetVariant>,
    #[serde(default = "default_dataset")]
    dataset: String,
    #[serde(default)]
    splitting: Option<Splitting>,
    #[serde(default)]
    json: Option<LumiFilter>,
}

impl TryFrom<SampleRecord> for Sample {
    type Error = SampleError;

    fn try_from(record: SampleRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| SampleError::InvalidRecord {
            sample: record.name.clone(),
            reason: reason.to_string(),
        };
        let provenance = match (record.kind, record.nevents, record.runs) {
            (RecordKind::Simulation, Some(nevents), None) => Provenance::Simulation { nevents },
            (RecordKind::Simulation, None, _) => return Err(invalid("simulation needs nevents")),
            (RecordKind::Simulation, Some(_), Some(_)) => {
                return Err(invalid("runs only apply to recorded data"))
            }
            (RecordKind::Recorded, None, runs) => Provenance::Recorded { runs },
            (RecordKind::Recorded, Some(_), _) => {
                return Err(invalid("nevents only applies to simulation"))
            }
        };
        Ok(Self {
            name: record.name,
            provenance,
            condor: record.condor,
            datasets: record.datasets,
            curr_dataset: record.dataset,
            splitting: record.splitting,
            lumi_filter: record.json,
        })
    }
}

impl Sample {
    fn with_provenance(name: impl Into<String>, provenance: Provenance) -> Self {
        let mut datasets = IndexMap::new();
        datasets.insert(DEFAULT_DATASET.to_string(), DatasetVariant::default());
        Self {
            name: name.into(),
            provenance,
            condor: false,
            datasets,
            curr_dataset: default_dataset(),
            splitting: None,
            lumi_filter: None,
        }
    }

    /// Create a simulation sample with its generated event count
    #[must_use]
    pub fn simulation(name: impl Into<String>, nevents: u64) -> Self {
        Self::with_provenance(name, Provenance::Simulation { nevents })
    }

    /// Create a recorded-data sample
    #[must_use]
    pub fn recorded(name: impl Into<String>) -> Self {
        Self::with_provenance(name, Provenance::Recorded { runs: None })
    }

    /// With run range (recorded data only; ignored for simulation)
    #[must_use]
    pub fn with_runs(mut self, runs: RunRange) -> Self {
        if let Provenance::Recorded { runs: r } = &mut self.provenance {
            *r = Some(runs);
        }
        self
    }

    /// With backend affinity
    #[inline]
    #[must_use]
    pub fn with_condor(mut self, condor: bool) -> Self {
        self.condor = condor;
        self
    }

    /// With an additional (or replaced) dataset variant
    #[must_use]
    pub fn with_dataset(mut self, name: impl Into<String>, variant: DatasetVariant) -> Self {
        self.datasets.insert(name.into(), variant);
        self
    }

    /// Sample name (unique within a catalog)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provenance record
    #[inline]
    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Simulation vs recorded data
    #[inline]
    #[must_use]
    pub fn is_mc(&self) -> bool {
        matches!(self.provenance, Provenance::Simulation { .. })
    }

    /// Generated events, for simulation
    #[inline]
    #[must_use]
    pub fn nevents(&self) -> Option<u64> {
        match self.provenance {
            Provenance::Simulation { nevents } => Some(nevents),
            Provenance::Recorded { .. } => None,
        }
    }

    /// Run range, for recorded data
    #[inline]
    #[must_use]
    pub fn runs(&self) -> Option<RunRange> {
        match self.provenance {
            Provenance::Simulation { .. } => None,
            Provenance::Recorded { runs } => runs,
        }
    }

    /// Backend affinity: true prefers the local pool
    #[inline]
    #[must_use]
    pub fn condor(&self) -> bool {
        self.condor
    }

    /// Check if a dataset variant exists
    #[inline]
    #[must_use]
    pub fn has_dataset(&self, dataset: &str) -> bool {
        self.datasets.contains_key(dataset)
    }

    /// Names of all dataset variants
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// Currently selected variant key
    #[inline]
    #[must_use]
    pub fn curr_dataset(&self) -> &str {
        &self.curr_dataset
    }

    /// Currently selected variant
    #[inline]
    #[must_use]
    pub fn current_variant(&self) -> Option<&DatasetVariant> {
        self.datasets.get(&self.curr_dataset)
    }

    /// Select the dataset variant used from now on
    ///
    /// # Errors
    /// `SampleError::UnknownDataset` if the sample has no such variant
    pub fn set_curr_dataset(&mut self, dataset: &str) -> Result<(), SampleError> {
        if !self.has_dataset(dataset) {
            return Err(SampleError::UnknownDataset {
                sample: self.name.clone(),
                dataset: dataset.to_string(),
            });
        }
        dataset.clone_into(&mut self.curr_dataset);
        Ok(())
    }

    /// Resolved splitting, if a policy has run
    #[inline]
    #[must_use]
    pub fn splitting(&self) -> Option<&Splitting> {
        self.splitting.as_ref()
    }

    /// Store a resolved splitting
    #[inline]
    pub fn set_splitting(&mut self, splitting: Splitting) {
        self.splitting = Some(splitting);
    }

    /// Attached lumi filter
    #[inline]
    #[must_use]
    pub fn lumi_filter(&self) -> Option<&LumiFilter> {
        self.lumi_filter.as_ref()
    }

    /// Attach a lumi filter
    ///
    /// # Errors
    /// `SampleError::LumiFilterOnSimulation` for simulation samples
    pub fn set_lumi_filter(&mut self, filter: LumiFilter) -> Result<(), SampleError> {
        if self.is_mc() {
            return Err(SampleError::LumiFilterOnSimulation(self.name.clone()));
        }
        self.lumi_filter = Some(filter);
        Ok(())
    }

    /// Number of jobs the current splitting produces, when counts are known
    ///
    /// Event splitting uses the variant's event count, falling back to the
    /// generated count of a simulation sample.
    #[must_use]
    pub fn estimated_jobs(&self) -> Option<u64> {
        let splitting = self.splitting?;
        let variant = self.current_variant();
        match splitting.split_by {
            SplitBy::Events => {
                let events = variant.and_then(|v| v.nevents).or_else(|| self.nevents())?;
                Some(events.div_ceil(splitting.events_per))
            }
            SplitBy::Files => {
                let files = variant.and_then(|v| v.nfiles)?;
                Some(files.div_ceil(splitting.files_per))
            }
        }
    }

    /// Check record-level invariants after deserialization
    ///
    /// Inserts the default variant when none is declared.
    pub(crate) fn normalize(&mut self) -> Result<(), SampleError> {
        check_name(&self.name)?;
        if self.datasets.is_empty() {
            self.datasets
                .insert(DEFAULT_DATASET.to_string(), DatasetVariant::default());
        }
        if !self.has_dataset(&self.curr_dataset) {
            return Err(SampleError::UnknownDataset {
                sample: self.name.clone(),
                dataset: self.curr_dataset.clone(),
            });
        }
        if self.is_mc() && self.lumi_filter.is_some() {
            return Err(SampleError::LumiFilterOnSimulation(self.name.clone()));
        }
        if let Some(splitting) = &self.splitting {
            splitting.validate(&self.name)?;
        }
        Ok(())
    }
}

/// Sample names become file names; they must stay a single path component
fn check_name(name: &str) -> Result<(), SampleError> {
    let reason = if name.trim().is_empty() {
        "name is empty"
    } else if name.contains(['/', '\\']) {
        "name contains a path separator"
    } else if name.contains("..") {
        "name contains '..'"
    } else {
        return Ok(());
    };
    Err(SampleError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_sample_basics() {
        let s = Sample::simulation("ttbar", 1000).with_condor(true);
        assert!(s.is_mc());
        assert!(s.condor());
        assert_eq!(s.nevents(), Some(1000));
        assert_eq!(s.curr_dataset(), DEFAULT_DATASET);
        assert!(s.splitting().is_none());
    }

    #[test]
    fn lumi_filter_rejected_on_simulation() {
        let mut s = Sample::simulation("qcdht0700", 10);
        let err = s.set_lumi_filter(LumiFilter::from("a.json")).unwrap_err();
        assert!(matches!(err, SampleError::LumiFilterOnSimulation(_)));
        assert!(s.lumi_filter().is_none());

        let mut d = Sample::recorded("JetHT2017C");
        d.set_lumi_filter(LumiFilter::from("a.json")).unwrap();
        assert_eq!(d.lumi_filter().unwrap().to_string(), "a.json");
    }

    #[test]
    fn curr_dataset_must_exist() {
        let mut s = Sample::simulation("ttbar", 10)
            .with_dataset("miniaod", DatasetVariant::new().with_files(4));
        s.set_curr_dataset("miniaod").unwrap();
        assert_eq!(s.current_variant().unwrap().nfiles, Some(4));

        let err = s.set_curr_dataset("ntuplev20").unwrap_err();
        assert!(matches!(err, SampleError::UnknownDataset { .. }));
        assert_eq!(s.curr_dataset(), "miniaod");
    }

    #[test]
    fn splitting_rejects_zero() {
        assert!(Splitting::new("x", SplitBy::Files, 1, 0).is_err());
        assert!(Splitting::new("x", SplitBy::Events, 0, 1).is_err());
        assert!(Splitting::new("x", SplitBy::Events, 1, 1).is_ok());
    }

    #[test]
    fn estimated_jobs_rounds_up() {
        let mut s = Sample::simulation("ttbar", 1001)
            .with_dataset("main", DatasetVariant::new().with_files(41));

        assert_eq!(s.estimated_jobs(), None);

        s.set_splitting(Splitting::new("ttbar", SplitBy::Events, 100, 1).unwrap());
        assert_eq!(s.estimated_jobs(), Some(11));

        s.set_splitting(Splitting::new("ttbar", SplitBy::Files, 100, 20).unwrap());
        assert_eq!(s.estimated_jobs(), Some(3));
    }

    #[test]
    fn estimated_jobs_unknown_counts() {
        let mut d = Sample::recorded("JetHT2017D");
        d.set_splitting(Splitting::new("JetHT2017D", SplitBy::Events, 100, 1).unwrap());
        assert_eq!(d.estimated_jobs(), None);
    }

    #[test]
    fn split_by_parses() {
        assert_eq!("files".parse::<SplitBy>().unwrap(), SplitBy::Files);
        assert_eq!("events".parse::<SplitBy>().unwrap(), SplitBy::Events);
        assert!("lumis".parse::<SplitBy>().is_err());
    }
}
