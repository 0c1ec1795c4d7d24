//! Submission dispatch
//!
//! Provides [`SubmissionDispatcher`], which turns validated batches into
//! either a printed report or one submitter call per non-empty backend batch.

use std::fmt::{self, Display, Formatter};

use crate::error::SubmitError;
use crate::submitter::SubmitterFactory;
use crate::types::{Backend, Batch, ExecutionMode, SubmissionReceipt};

/// Per-backend sample routing, as printed by a dry run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingReport {
    /// Batch name
    pub batch_name: String,
    /// Sample names per backend, in submission order
    pub groups: Vec<(Backend, Vec<String>)>,
}

impl RoutingReport {
    /// Build report from batches
    #[must_use]
    pub fn from_batches(batches: &[Batch]) -> Self {
        Self {
            batch_name: batches
                .first()
                .map(|b| b.batch_name.clone())
                .unwrap_or_default(),
            groups: batches
                .iter()
                .map(|b| {
                    let names = b.samples.iter().map(|s| s.name().to_string()).collect();
                    (b.backend, names)
                })
                .collect(),
        }
    }

    /// Names routed to a backend
    #[must_use]
    pub fn names(&self, backend: Backend) -> &[String] {
        self.groups
            .iter()
            .find(|(b, _)| *b == backend)
            .map_or(&[][..], |(_, names)| names.as_slice())
    }
}

impl Display for RoutingReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (backend, names) in &self.groups {
            writeln!(f, "{}: {backend} samples =", self.batch_name)?;
            for name in names {
                writeln!(f, "  {name}")?;
            }
        }
        Ok(())
    }
}

/// Per-batch summaries printed by a build run
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// Batches in submission order, empty ones included
    pub batches: Vec<Batch>,
}

impl Display for BuildReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for batch in &self.batches {
            writeln!(
                f,
                "{} [{}] dataset={} ex={:?} stageout={:?} samples={} jobs~{}",
                batch.batch_name,
                batch.backend,
                batch.kwargs.dataset,
                batch.kwargs.ex,
                batch.kwargs.stageout_files,
                batch.samples.len(),
                batch.estimated_jobs(),
            )?;
            for sample in &batch.samples {
                let splitting = sample
                    .splitting()
                    .map_or_else(|| "unsplit".to_string(), ToString::to_string);
                write!(f, "  {:<40} {splitting}", sample.name())?;
                if let Some(jobs) = sample.estimated_jobs() {
                    write!(f, " jobs={jobs}")?;
                }
                if let Some(filter) = sample.lumi_filter() {
                    write!(f, " json={filter}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// What a dispatch did
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Build mode: summaries only
    Built(BuildReport),
    /// Dry-run mode: routing only
    DryRun(RoutingReport),
    /// Submit mode: one receipt per non-empty batch
    Submitted(Vec<SubmissionReceipt>),
}

impl Display for DispatchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Built(report) => report.fmt(f),
            Self::DryRun(report) => report.fmt(f),
            Self::Submitted(receipts) => {
                if receipts.is_empty() {
                    return writeln!(f, "nothing to submit");
                }
                for r in receipts {
                    write!(
                        f,
                        "{} [{}] {}: {} samples, {} jobs",
                        r.batch_name,
                        r.backend,
                        r.batch_id,
                        r.samples.len(),
                        r.jobs
                    )?;
                    if let Some(location) = &r.location {
                        write!(f, " -> {}", location.display())?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Hands validated batches to backend submitters
#[derive(Debug, Clone)]
pub struct SubmissionDispatcher<F> {
    factory: F,
}

impl<F: SubmitterFactory> SubmissionDispatcher<F> {
    /// Create new dispatcher
    #[inline]
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Dispatch batches according to the execution mode
    ///
    /// Build and dry-run modes never call the factory. Submit mode calls it
    /// once per non-empty batch, grid before pool; zero non-empty batches is
    /// not an error.
    ///
    /// # Errors
    /// The first submitter construction or submission failure
    pub fn dispatch(
        &self,
        mode: ExecutionMode,
        batches: &[Batch],
    ) -> Result<DispatchOutcome, SubmitError> {
        match mode {
            ExecutionMode::Build => Ok(DispatchOutcome::Built(BuildReport {
                batches: batches.to_vec(),
            })),
            ExecutionMode::DryRun => Ok(DispatchOutcome::DryRun(RoutingReport::from_batches(
                batches,
            ))),
            ExecutionMode::Submit => self.submit(batches).map(DispatchOutcome::Submitted),
        }
    }

    fn submit(&self, batches: &[Batch]) -> Result<Vec<SubmissionReceipt>, SubmitError> {
        let mut ordered: Vec<&Batch> = batches.iter().collect();
        ordered.sort_by_key(|b| b.backend);

        let mut receipts = Vec::new();
        for batch in ordered {
            if batch.is_empty() {
                tracing::debug!(backend = %batch.backend, "no samples, skipping backend");
                continue;
            }
            tracing::info!(
                backend = %batch.backend,
                batch = %batch.batch_name,
                samples = batch.samples.len(),
                "submitting batch"
            );
            let mut submitter = self
                .factory
                .create(batch.backend, &batch.batch_name, &batch.kwargs)?;
            receipts.push(submitter.submit_all(&batch.samples)?);
        }
        Ok(receipts)
    }
}
