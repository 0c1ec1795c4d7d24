//! Batch orchestrator
//!
//! The pipeline for one run:
//! - Select samples from the catalog
//! - Resolve splittings for the run's job type
//! - Route samples to backends and resolve keywords
//! - Validate template edits and job ceilings for every sample
//! - Dispatch according to the execution mode
//!
//! Validation is global: no submitter is constructed until every selected
//! sample has passed.

use batchsub_modifier::{JobTemplate, ModifierChain, ModifierSpec};
use batchsub_sample::{Sample, SampleCatalog};
use batchsub_splitting::{JobType, SplittingPolicy};

use crate::config::RunConfig;
use crate::dispatcher::{DispatchOutcome, SubmissionDispatcher};
use crate::error::SubmitError;
use crate::router::BackendRouter;
use crate::submitter::SubmitterFactory;
use crate::types::{Batch, ExecutionMode};

/// Runs one configured batch build against an immutable catalog
#[derive(Debug)]
pub struct BatchOrchestrator<'a> {
    catalog: &'a SampleCatalog,
    template: &'a JobTemplate,
    config: RunConfig,
    job_type: JobType,
    policy: SplittingPolicy,
    router: BackendRouter,
}

impl<'a> BatchOrchestrator<'a> {
    /// Create new orchestrator
    ///
    /// # Errors
    /// `UnknownJobType` for the run's job type or a splitting overlay
    pub fn new(
        catalog: &'a SampleCatalog,
        template: &'a JobTemplate,
        config: RunConfig,
    ) -> Result<Self, SubmitError> {
        let job_type = config.job_type()?;
        let policy = config.policy()?;
        let router = BackendRouter::new(config.backend_override).with_kwargs(
            config.common.clone(),
            config.grid.clone(),
            config.pool.clone(),
        );
        Ok(Self {
            catalog,
            template,
            config,
            job_type,
            policy,
            router,
        })
    }

    /// Run configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Parsed job type
    #[inline]
    #[must_use]
    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    fn select(&self) -> Result<Vec<Sample>, SubmitError> {
        if self.config.samples.is_empty() {
            return Ok(self.catalog.iter().cloned().collect());
        }
        Ok(self.catalog.select(&self.config.samples)?)
    }

    /// Build and validate every batch without dispatching
    ///
    /// # Errors
    /// The first selection, splitting, dataset, template-drift or ceiling
    /// failure; no batch is returned if any sample fails
    pub fn prepare(&self) -> Result<Vec<Batch>, SubmitError> {
        let mut samples = self.select()?;
        tracing::info!(
            batch = %self.config.batch_name,
            job_type = %self.job_type,
            samples = samples.len(),
            "preparing batches"
        );

        self.policy.apply(
            self.job_type,
            &mut samples,
            &self.config.dataset,
            self.config.lumi_filter.as_ref(),
        )?;

        let batches = self
            .router
            .batches(&self.config.batch_name, samples, &self.config.dataset)?;
        for batch in &batches {
            let chain = ModifierSpec::chain(&batch.kwargs.modifiers)?;
            self.validate(batch, &chain)?;
        }
        Ok(batches)
    }

    fn validate(&self, batch: &Batch, chain: &ModifierChain) -> Result<(), SubmitError> {
        for sample in &batch.samples {
            if sample.splitting().is_none() {
                return Err(SubmitError::Unsplit(sample.name().to_string()));
            }
            chain.validated_edits(self.template, sample)?;
            Self::check_ceiling(batch, sample)?;
        }
        tracing::debug!(
            backend = %batch.backend,
            samples = batch.samples.len(),
            jobs = batch.estimated_jobs(),
            "batch validated"
        );
        Ok(())
    }

    fn check_ceiling(batch: &Batch, sample: &Sample) -> Result<(), SubmitError> {
        let Some(limit) = batch.kwargs.max_jobs else {
            return Ok(());
        };
        if !batch.kwargs.job_control_from_sample {
            tracing::debug!(
                sample = sample.name(),
                backend = %batch.backend,
                "job ceiling not checked, backend controls splitting"
            );
            return Ok(());
        }
        let Some(jobs) = sample.estimated_jobs() else {
            tracing::debug!(
                sample = sample.name(),
                backend = %batch.backend,
                limit,
                "job ceiling not checked, no file or event count"
            );
            return Ok(());
        };
        if jobs > limit {
            return Err(SubmitError::JobCeilingExceeded {
                sample: sample.name().to_string(),
                backend: batch.backend,
                jobs,
                limit,
            });
        }
        Ok(())
    }

    /// Prepare every batch, then dispatch them
    ///
    /// # Errors
    /// Any preparation failure, before a submitter is built, or the first
    /// dispatch failure
    pub fn run<F: SubmitterFactory>(
        &self,
        mode: ExecutionMode,
        factory: F,
    ) -> Result<DispatchOutcome, SubmitError> {
        let batches = self.prepare()?;
        SubmissionDispatcher::new(factory).dispatch(mode, &batches)
    }
}
