//! Backend submitter seams

use batchsub_sample::Sample;

use crate::config::ResolvedKwargs;
use crate::error::SubmitError;
use crate::types::{Backend, SubmissionReceipt};

/// Submits one logical batch to a backend
#[cfg_attr(test, mockall::automock)]
pub trait Submitter {
    /// Create job artifacts for every sample and hand them to the backend
    ///
    /// # Errors
    /// Backend-specific failure; nothing is retried
    fn submit_all(&mut self, samples: &[Sample]) -> Result<SubmissionReceipt, SubmitError>;
}

/// Constructs a backend's submitter from `(batch_name, kwargs)`
#[cfg_attr(test, mockall::automock)]
pub trait SubmitterFactory {
    /// Build the submitter for a backend
    ///
    /// # Errors
    /// Invalid keywords for that backend
    fn create(
        &self,
        backend: Backend,
        batch_name: &str,
        kwargs: &ResolvedKwargs,
    ) -> Result<Box<dyn Submitter>, SubmitError>;
}

impl<F: SubmitterFactory + ?Sized> SubmitterFactory for &F {
    fn create(
        &self,
        backend: Backend,
        batch_name: &str,
        kwargs: &ResolvedKwargs,
    ) -> Result<Box<dyn Submitter>, SubmitError> {
        (**self).create(backend, batch_name, kwargs)
    }
}
