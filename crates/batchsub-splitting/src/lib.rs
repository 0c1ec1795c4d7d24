//! batchsub Splitting Policy
//!
//! Assigns every sample a splitting granularity (`files` or `events`) and
//! chunk sizes for a declared job type.
//!
//! # Core Concepts
//!
//! - [`JobType`]: the kind of batch being built; unknown names are fatal
//! - [`JobClass`]: the heuristic family a job type belongs to
//! - [`JobTypeTable`]: per-sample entries (explicit chunks, files only, or rates)
//! - [`SplittingPolicy`]: resolves and applies splittings to a sample list
//!
//! # Example
//!
//! ```rust
//! use batchsub_sample::{Sample, SplitBy};
//! use batchsub_splitting::{JobType, SplittingPolicy};
//!
//! let policy = SplittingPolicy::reference();
//! let mut samples = vec![Sample::simulation("not_in_any_table", 1000)];
//! policy.apply(JobType::Histos, &mut samples, "main", None).unwrap();
//!
//! let s = samples[0].splitting().unwrap();
//! assert_eq!(s.split_by, SplitBy::Files);
//! assert_eq!(s.files_per, 20);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod job_type;
mod policy;
pub mod reference;
mod table;

pub use error::SplittingError;
pub use job_type::{JobClass, JobType};
pub use policy::{
    SplittingPolicy, FALLBACK_EVENTS_PER, FALLBACK_FILES_PER, FALLBACK_MC_EVENTS_PER,
    FALLBACK_MC_FILES_PER, FALLBACK_MC_FILES_PER_OFFICIAL, FILE_GRANULAR_DEFAULT_FILES_PER,
    MAX_EVENTS_PER_JOB, OFFICIAL_TAG, RATE_TARGET_EVENTS, UNIFORM_DEFAULT_FILES_PER,
};
pub use table::{JobTypeTable, TableEntry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
