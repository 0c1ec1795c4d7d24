//! Per job-type splitting tables

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One sample's row in a job-type table
///
/// Deserialized untagged: `{ events_per, files_per }`, `{ files_per }`, or
/// `{ event_rate, file_fraction }`. A row with keys from more than one shape
/// matches none of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum TableEntry {
    /// Explicit chunk sizes
    Explicit {
        /// Events per job
        events_per: u64,
        /// Files per job
        files_per: u64,
    },
    /// Files per job only
    Files {
        /// Files per job
        files_per: u64,
    },
    /// Inputs to the rate-based formula
    Rate {
        /// Input events needed to keep one output event
        event_rate: f64,
        /// Input-file fraction corresponding to one kept event
        file_fraction: f64,
    },
}

impl TableEntry {
    /// Check the entry can produce positive chunk sizes
    ///
    /// # Errors
    /// Human-readable reason on failure
    pub fn check(&self) -> Result<(), String> {
        match *self {
            Self::Explicit {
                events_per,
                files_per,
            } => {
                if events_per == 0 || files_per == 0 {
                    return Err(format!(
                        "chunk sizes must be positive (events_per={events_per}, files_per={files_per})"
                    ));
                }
            }
            Self::Files { files_per } => {
                if files_per == 0 {
                    return Err("files_per must be positive".to_string());
                }
            }
            Self::Rate {
                event_rate,
                file_fraction,
            } => {
                if !(event_rate.is_finite() && event_rate > 0.0) {
                    return Err(format!("event_rate must be positive, got {event_rate}"));
                }
                if !(file_fraction.is_finite() && file_fraction >= 0.0) {
                    return Err(format!(
                        "file_fraction must be non-negative, got {file_fraction}"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Files per job carried by the entry, if any
    #[inline]
    #[must_use]
    pub fn files_per(&self) -> Option<u64> {
        match *self {
            Self::Explicit { files_per, .. } | Self::Files { files_per } => Some(files_per),
            Self::Rate { .. } => None,
        }
    }
}

/// Mapping from sample name to splitting entry for one job type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobTypeTable {
    entries: IndexMap<String, TableEntry>,
}

impl JobTypeTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, sample: impl Into<String>, entry: TableEntry) -> Option<TableEntry> {
        self.entries.insert(sample.into(), entry)
    }

    /// With an explicit `(events_per, files_per)` entry
    #[must_use]
    pub fn explicit(mut self, sample: impl Into<String>, events_per: u64, files_per: u64) -> Self {
        self.insert(
            sample,
            TableEntry::Explicit {
                events_per,
                files_per,
            },
        );
        self
    }

    /// With a files-only entry
    #[must_use]
    pub fn files(mut self, sample: impl Into<String>, files_per: u64) -> Self {
        self.insert(sample, TableEntry::Files { files_per });
        self
    }

    /// With a rate entry
    #[must_use]
    pub fn rate(mut self, sample: impl Into<String>, event_rate: f64, file_fraction: f64) -> Self {
        self.insert(
            sample,
            TableEntry::Rate {
                event_rate,
                file_fraction,
            },
        );
        self
    }

    /// Look up a sample
    #[inline]
    #[must_use]
    pub fn get(&self, sample: &str) -> Option<&TableEntry> {
        self.entries.get(sample)
    }

    /// Check if a sample has an entry
    #[inline]
    #[must_use]
    pub fn contains(&self, sample: &str) -> bool {
        self.entries.contains_key(sample)
    }

    /// Overlay another table; its entries win
    pub fn extend(&mut self, other: &JobTypeTable) {
        self.entries
            .extend(other.entries.iter().map(|(k, v)| (k.clone(), *v)));
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
