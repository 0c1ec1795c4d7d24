//! Testing utilities for the batchsub workspace
//!
//! Shared fixtures and a recording submitter factory.

#![allow(missing_docs)]

use std::sync::{Arc, Mutex, PoisonError};

use batchsub_core::{
    Backend, ResolvedKwargs, SubmissionReceipt, SubmitError, Submitter, SubmitterFactory,
};
use batchsub_modifier::JobTemplate;
use batchsub_sample::{DatasetVariant, Sample, SampleCatalog};

/// Template carrying both markers
pub const REFERENCE_TEMPLATE: &str = "\
import FWCore.ParameterSet.Config as cms
process = cms.Process('Histos')
is_mc = True
H = False
";

pub fn reference_template() -> JobTemplate {
    JobTemplate::compile(REFERENCE_TEMPLATE)
}

/// Simulation on the grid, simulation on the pool, and recorded data
pub fn three_sample_catalog() -> SampleCatalog {
    let mut catalog = SampleCatalog::new();
    catalog
        .insert(
            Sample::simulation("ttbar_pool", 38_000)
                .with_condor(true)
                .with_dataset("main", DatasetVariant::new().with_files(100)),
        )
        .unwrap();
    catalog
        .insert(
            Sample::simulation("ttbar_grid", 38_000)
                .with_dataset("main", DatasetVariant::new().with_files(60)),
        )
        .unwrap();
    catalog
        .insert(
            Sample::recorded("JetHTRun9Z")
                .with_dataset("main", DatasetVariant::new().with_files(45)),
        )
        .unwrap();
    catalog
}

/// One submitter call as seen by [`RecordingFactory`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitCall {
    pub backend: Backend,
    pub batch_name: String,
    pub kwargs: ResolvedKwargs,
    pub samples: Vec<Sample>,
}

impl SubmitCall {
    pub fn names(&self) -> Vec<&str> {
        self.samples.iter().map(Sample::name).collect()
    }
}

/// Factory whose submitters accept everything and record what they got
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    calls: Arc<Mutex<Vec<SubmitCall>>>,
    created: Arc<Mutex<Vec<Backend>>>,
    fail_on: Option<Backend>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submitters for `backend` fail instead of recording
    pub fn failing_on(backend: Backend) -> Self {
        Self {
            fail_on: Some(backend),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SubmitCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Backends a submitter was built for, in order
    pub fn created(&self) -> Vec<Backend> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SubmitterFactory for RecordingFactory {
    fn create(
        &self,
        backend: Backend,
        batch_name: &str,
        kwargs: &ResolvedKwargs,
    ) -> Result<Box<dyn Submitter>, SubmitError> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(backend);
        Ok(Box::new(RecordingSubmitter {
            backend,
            batch_name: batch_name.to_string(),
            kwargs: kwargs.clone(),
            fail: self.fail_on == Some(backend),
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct RecordingSubmitter {
    backend: Backend,
    batch_name: String,
    kwargs: ResolvedKwargs,
    fail: bool,
    calls: Arc<Mutex<Vec<SubmitCall>>>,
}

impl Submitter for RecordingSubmitter {
    fn submit_all(&mut self, samples: &[Sample]) -> Result<SubmissionReceipt, SubmitError> {
        if self.fail {
            return Err(SubmitError::backend(self.backend, "rejected by test"));
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SubmitCall {
                backend: self.backend,
                batch_name: self.batch_name.clone(),
                kwargs: self.kwargs.clone(),
                samples: samples.to_vec(),
            });
        Ok(SubmissionReceipt::for_batch(
            &self.batch_name,
            self.backend,
            samples,
        ))
    }
}
