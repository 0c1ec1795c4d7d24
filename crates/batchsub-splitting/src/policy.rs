//! Splitting policy
//!
//! Resolution is a pure function of `(job type, table, sample state)`;
//! [`SplittingPolicy::apply`] stores the result on each sample in place.

use std::collections::HashMap;

use batchsub_sample::{LumiFilter, Sample, SplitBy, Splitting};

use crate::error::SplittingError;
use crate::job_type::{JobClass, JobType};
use crate::reference;
use crate::table::{JobTypeTable, TableEntry};

/// Output events a rate-based job aims for
pub const RATE_TARGET_EVENTS: f64 = 5000.0;

/// Ceiling on events per rate-based job
pub const MAX_EVENTS_PER_JOB: u64 = 200_000;

/// Files per job for file-granular samples absent from the table
pub const FILE_GRANULAR_DEFAULT_FILES_PER: u64 = 20;

/// Files per job for the `default` job type unless configured
pub const UNIFORM_DEFAULT_FILES_PER: u64 = 50;

/// Rate-based fallback: events per job for simulation
pub const FALLBACK_MC_EVENTS_PER: u64 = 1000;

/// Rate-based fallback: files per job for officially produced simulation
pub const FALLBACK_MC_FILES_PER_OFFICIAL: u64 = 1;

/// Rate-based fallback: files per job for other simulation
pub const FALLBACK_MC_FILES_PER: u64 = 10;

/// Rate-based fallback: events per job for recorded data
pub const FALLBACK_EVENTS_PER: u64 = 50_000;

/// Rate-based fallback: files per job for recorded data
pub const FALLBACK_FILES_PER: u64 = 5;

/// Name fragment marking officially produced simulation
pub const OFFICIAL_TAG: &str = "official";

/// Events-per value kept on file-split samples that never had one
const UNUSED_EVENTS_PER: u64 = 1;

/// Table-driven splitting heuristics for every job type
#[derive(Debug, Clone)]
pub struct SplittingPolicy {
    tables: HashMap<JobType, JobTypeTable>,
    default_files_per: u64,
    rate_target: f64,
}

impl SplittingPolicy {
    /// Policy with no table entries
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
            default_files_per: UNIFORM_DEFAULT_FILES_PER,
            rate_target: RATE_TARGET_EVENTS,
        }
    }

    /// Policy seeded with the built-in reference tables
    #[must_use]
    pub fn reference() -> Self {
        Self::empty()
            .with_table(JobType::TrackMover, &reference::TRACKMOVER)
            .with_table(JobType::Histos, &reference::HISTOS)
            .with_table(JobType::MiniTree, &reference::HISTOS)
            .with_table(JobType::Ntuple, &reference::NTUPLE)
    }

    /// Overlay entries for a job type; later entries win
    #[must_use]
    pub fn with_table(mut self, job_type: JobType, table: &JobTypeTable) -> Self {
        self.tables.entry(job_type).or_default().extend(table);
        self
    }

    /// Files per job for the `default` job type
    #[inline]
    #[must_use]
    pub fn with_default_files_per(mut self, files_per: u64) -> Self {
        self.default_files_per = files_per;
        self
    }

    /// Output events targeted by rate-based jobs
    #[inline]
    #[must_use]
    pub fn with_rate_target(mut self, target: f64) -> Self {
        self.rate_target = target;
        self
    }

    /// Table for a job type
    #[inline]
    #[must_use]
    pub fn table(&self, job_type: JobType) -> Option<&JobTypeTable> {
        self.tables.get(&job_type)
    }

    fn entry(&self, job_type: JobType, sample: &str) -> Result<Option<TableEntry>, SplittingError> {
        let Some(entry) = self.tables.get(&job_type).and_then(|t| t.get(sample)) else {
            return Ok(None);
        };
        entry.check().map_err(|reason| SplittingError::InvalidEntry {
            job_type: job_type.to_string(),
            sample: sample.to_string(),
            reason,
        })?;
        Ok(Some(*entry))
    }

    /// Compute the splitting for one sample without storing it
    ///
    /// # Errors
    /// - `MissingEntry` for a sample absent from an exhaustive table
    /// - `InvalidEntry` for an entry unusable by the job type
    /// - `Sample` if the result breaks the chunk-size invariant
    pub fn resolve(&self, job_type: JobType, sample: &Sample) -> Result<Splitting, SplittingError> {
        let name = sample.name();
        let entry = self.entry(job_type, name)?;
        let kept_events_per = sample
            .splitting()
            .map_or(UNUSED_EVENTS_PER, |s| s.events_per);

        let (split_by, events_per, files_per) = match job_type.class() {
            JobClass::IoSensitive => {
                // Event-range reads over the wide-area path are expensive; the
                // local pool reads whole files cheaply.
                let split_by = if sample.condor() {
                    SplitBy::Files
                } else {
                    SplitBy::Events
                };
                match entry {
                    Some(TableEntry::Explicit {
                        events_per,
                        files_per,
                    }) => (split_by, events_per, files_per),
                    Some(other) => {
                        return Err(SplittingError::InvalidEntry {
                            job_type: job_type.to_string(),
                            sample: name.to_string(),
                            reason: format!("needs explicit events_per and files_per, got {other:?}"),
                        })
                    }
                    None => {
                        return Err(SplittingError::MissingEntry {
                            job_type: job_type.to_string(),
                            sample: name.to_string(),
                        })
                    }
                }
            }
            JobClass::FileGranular => {
                let files_per = match entry {
                    Some(e) => e.files_per().ok_or_else(|| SplittingError::InvalidEntry {
                        job_type: job_type.to_string(),
                        sample: name.to_string(),
                        reason: "rate entries do not apply to file-granular jobs".to_string(),
                    })?,
                    None => FILE_GRANULAR_DEFAULT_FILES_PER,
                };
                (SplitBy::Files, kept_events_per, files_per)
            }
            JobClass::RateBased => {
                let split_by = if sample.condor() {
                    SplitBy::Files
                } else {
                    SplitBy::Events
                };
                let (events_per, files_per) = match entry {
                    Some(TableEntry::Rate {
                        event_rate,
                        file_fraction,
                    }) => rate_chunks(self.rate_target, event_rate, file_fraction),
                    Some(TableEntry::Explicit {
                        events_per,
                        files_per,
                    }) => (events_per, files_per),
                    Some(TableEntry::Files { .. }) => {
                        return Err(SplittingError::InvalidEntry {
                            job_type: job_type.to_string(),
                            sample: name.to_string(),
                            reason: "rate-based jobs need a rate or explicit entry".to_string(),
                        })
                    }
                    None => rate_fallback(sample),
                };
                (split_by, events_per, files_per)
            }
            JobClass::Uniform => {
                let files_per = entry
                    .and_then(|e| e.files_per())
                    .unwrap_or(self.default_files_per);
                (SplitBy::Files, kept_events_per, files_per)
            }
        };

        Ok(Splitting::new(name, split_by, events_per, files_per)?)
    }

    /// Select the dataset variant, resolve and store the splitting of every
    /// sample, then attach the lumi filter to every recorded-data sample
    ///
    /// Nothing is stored unless every sample resolves.
    ///
    /// # Errors
    /// The first sample that cannot be resolved, or a missing dataset variant
    pub fn apply(
        &self,
        job_type: JobType,
        samples: &mut [Sample],
        dataset: &str,
        lumi_filter: Option<&LumiFilter>,
    ) -> Result<(), SplittingError> {
        let mut resolved = Vec::with_capacity(samples.len());
        for sample in samples.iter() {
            if !sample.has_dataset(dataset) {
                return Err(batchsub_sample::SampleError::UnknownDataset {
                    sample: sample.name().to_string(),
                    dataset: dataset.to_string(),
                }
                .into());
            }
            resolved.push(self.resolve(job_type, sample)?);
        }

        for (sample, splitting) in samples.iter_mut().zip(resolved) {
            sample.set_curr_dataset(dataset)?;
            tracing::debug!(
                sample = sample.name(),
                job_type = %job_type,
                split_by = %splitting.split_by,
                events_per = splitting.events_per,
                files_per = splitting.files_per,
                "resolved splitting"
            );
            sample.set_splitting(splitting);
        }

        if let Some(filter) = lumi_filter {
            for sample in samples.iter_mut().filter(|s| !s.is_mc()) {
                sample.set_lumi_filter(filter.clone())?;
            }
        }

        tracing::info!(
            job_type = %job_type,
            samples = samples.len(),
            lumi_filter = ?lumi_filter.map(ToString::to_string),
            "splitting applied"
        );
        Ok(())
    }
}

impl Default for SplittingPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

/// Rate-table branch: truncation after adding one, for both chunk sizes
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn rate_chunks(target: f64, event_rate: f64, file_fraction: f64) -> (u64, u64) {
    let events_per = ((target * event_rate + 1.0).floor() as u64).min(MAX_EVENTS_PER_JOB);
    let files_per = (file_fraction * events_per as f64 / event_rate + 1.0).floor() as u64;
    (events_per, files_per.max(1))
}

/// Flat constants for samples missing from the rate table; no rounding involved
///
/// Simulation is recognised by provenance, not by a signal tag in the name, so
/// background simulation missing from the table also gets the simulation
/// constants rather than the recorded-data ones.
fn rate_fallback(sample: &Sample) -> (u64, u64) {
    if sample.is_mc() {
        let files_per = if sample.name().contains(OFFICIAL_TAG) {
            FALLBACK_MC_FILES_PER_OFFICIAL
        } else {
            FALLBACK_MC_FILES_PER
        };
        (FALLBACK_MC_EVENTS_PER, files_per)
    } else {
        (FALLBACK_EVENTS_PER, FALLBACK_FILES_PER)
    }
}
