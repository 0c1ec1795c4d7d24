//! batchsub Core - batch orchestration
//!
//! Turns a selected slice of the sample catalog into per-backend batches:
//! - Resolves splittings for the run's job type
//! - Routes samples to the grid or the local pool
//! - Resolves keywords per backend from shared and backend sections
//! - Validates every sample before anything is submitted
//! - Dispatches batches in build, dry-run or submit mode
//!
//! # Example
//!
//! ```rust
//! use batchsub_core::{BatchOrchestrator, DispatchOutcome, ExecutionMode, RunConfig, StagingFactory};
//! use batchsub_modifier::JobTemplate;
//! use batchsub_sample::{Sample, SampleCatalog};
//! use std::sync::Arc;
//!
//! let mut catalog = SampleCatalog::new();
//! catalog.insert(Sample::simulation("ttbar", 1000)).unwrap();
//! catalog.insert(Sample::recorded("JetHT2016G").with_condor(true)).unwrap();
//!
//! let template = Arc::new(JobTemplate::compile("is_mc = True\n"));
//! let config = RunConfig::new("HistosV1", "histos", "histos.py");
//! let orchestrator = BatchOrchestrator::new(&catalog, &template, config).unwrap();
//!
//! let factory = StagingFactory::new("batches", Arc::clone(&template));
//! let outcome = orchestrator.run(ExecutionMode::DryRun, &factory).unwrap();
//! assert_eq!(
//!     outcome.to_string(),
//!     "HistosV1: grid samples =\n  ttbar\nHistosV1: pool samples =\n  JetHT2016G\n"
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod dispatcher;
mod error;
mod orchestrator;
mod router;
mod staging;
mod submitter;
mod types;

pub use config::{KwargsConfig, ResolvedKwargs, RunConfig};
pub use dispatcher::{BuildReport, DispatchOutcome, RoutingReport, SubmissionDispatcher};
pub use error::SubmitError;
pub use orchestrator::BatchOrchestrator;
pub use router::{BackendRouter, Routing};
pub use staging::{StagingFactory, StagingSubmitter, JOB_FILE_EXTENSION, MANIFEST_FILE};
pub use submitter::{Submitter, SubmitterFactory};
pub use types::{
    Backend, BackendOverride, Batch, ExecutionMode, StageOut, SubmissionReceipt,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
