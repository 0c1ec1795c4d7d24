//! batchsub Sample Model
//!
//! The unit every other batchsub crate operates on:
//! - [`Sample`]: one dataset descriptor plus the splitting fields a policy fills in
//! - [`DatasetVariant`]: a named file catalog a sample can be run on
//! - [`SampleCatalog`]: the immutable, explicitly passed set of known samples
//!
//! # Example
//!
//! ```rust
//! use batchsub_sample::{Sample, SampleCatalog};
//!
//! let mut catalog = SampleCatalog::new();
//! catalog.insert(Sample::simulation("ttbar", 1_000_000).with_condor(true)).unwrap();
//! catalog.insert(Sample::recorded("JetHT2017B")).unwrap();
//!
//! let selected = catalog.select(&["ttbar", "JetHT2017B"]).unwrap();
//! assert_eq!(selected.len(), 2);
//! assert!(selected[0].is_mc());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod catalog;
mod dataset;
mod error;
mod sample;

pub use catalog::{CatalogFile, SampleCatalog};
pub use dataset::{DatasetVariant, LumiFilter, RunRange, DEFAULT_DATASET};
pub use error::SampleError;
pub use sample::{Provenance, Sample, SplitBy, Splitting};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
