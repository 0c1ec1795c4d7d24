//! Backend routing
//!
//! Provides [`BackendRouter`], which splits a sample list into a grid group
//! and a local-pool group and binds each to its resolved keywords.

use batchsub_sample::Sample;

use crate::config::{KwargsConfig, ResolvedKwargs};
use crate::error::SubmitError;
use crate::types::{Backend, BackendOverride, Batch};

/// Samples partitioned by backend
///
/// Every input sample lands in exactly one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routing {
    /// Grid-bound samples in input order
    pub grid: Vec<Sample>,
    /// Local-pool-bound samples in input order
    pub pool: Vec<Sample>,
}

impl Routing {
    /// Samples bound for a backend
    #[inline]
    #[must_use]
    pub fn group(&self, backend: Backend) -> &[Sample] {
        match backend {
            Backend::Grid => &self.grid,
            Backend::Pool => &self.pool,
        }
    }

    /// Sample names bound for a backend
    #[must_use]
    pub fn names(&self, backend: Backend) -> Vec<&str> {
        self.group(backend).iter().map(Sample::name).collect()
    }

    /// Total number of samples
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.grid.len() + self.pool.len()
    }

    /// Check if both groups are empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty() && self.pool.is_empty()
    }
}

/// Assigns samples to backends and resolves per-backend keywords
#[derive(Debug, Clone, Default)]
pub struct BackendRouter {
    override_: BackendOverride,
    common: KwargsConfig,
    grid: KwargsConfig,
    pool: KwargsConfig,
}

impl BackendRouter {
    /// Create new router
    #[inline]
    #[must_use]
    pub fn new(override_: BackendOverride) -> Self {
        Self {
            override_,
            ..Self::default()
        }
    }

    /// With keyword sections
    #[must_use]
    pub fn with_kwargs(mut self, common: KwargsConfig, grid: KwargsConfig, pool: KwargsConfig) -> Self {
        self.common = common;
        self.grid = grid;
        self.pool = pool;
        self
    }

    /// Configured override
    #[inline]
    #[must_use]
    pub fn backend_override(&self) -> BackendOverride {
        self.override_
    }

    /// Backend a sample goes to
    #[inline]
    #[must_use]
    pub fn backend_for(&self, sample: &Sample) -> Backend {
        match self.override_.forced() {
            Some(backend) => backend,
            None if sample.condor() => Backend::Pool,
            None => Backend::Grid,
        }
    }

    /// Partition samples by backend
    #[must_use]
    pub fn route(&self, samples: Vec<Sample>) -> Routing {
        let (pool, grid): (Vec<Sample>, Vec<Sample>) = samples
            .into_iter()
            .partition(|s| self.backend_for(s) == Backend::Pool);
        let routing = Routing { grid, pool };
        tracing::debug!(
            override_ = %self.override_,
            grid = routing.grid.len(),
            pool = routing.pool.len(),
            "routed samples"
        );
        routing
    }

    /// Common keywords merged with a backend's own
    #[must_use]
    pub fn kwargs(&self, backend: Backend, run_dataset: &str) -> ResolvedKwargs {
        let specific = match backend {
            Backend::Grid => &self.grid,
            Backend::Pool => &self.pool,
        };
        ResolvedKwargs::resolve(&self.common, specific, backend, run_dataset)
    }

    /// Route samples into one batch per backend, in submission order
    ///
    /// Each sample is switched to its backend's dataset variant. Empty
    /// batches are kept; dispatch skips them.
    ///
    /// # Errors
    /// `SampleError::UnknownDataset` if a sample lacks its backend's variant
    pub fn batches(
        &self,
        batch_name: &str,
        samples: Vec<Sample>,
        run_dataset: &str,
    ) -> Result<Vec<Batch>, SubmitError> {
        let Routing { grid, pool } = self.route(samples);
        [(Backend::Grid, grid), (Backend::Pool, pool)]
            .into_iter()
            .map(|(backend, mut samples)| -> Result<Batch, SubmitError> {
                let kwargs = self.kwargs(backend, run_dataset);
                for sample in &mut samples {
                    sample.set_curr_dataset(&kwargs.dataset)?;
                }
                Ok(Batch {
                    batch_name: batch_name.to_string(),
                    backend,
                    samples,
                    kwargs,
                })
            })
            .collect()
    }
}
