//! Modifier trait and ordered chain
//!
//! Provides [`Modifier`] for per-sample template edits and [`ModifierChain`]
//! for composing them in registration order.

use std::fmt;

use batchsub_sample::Sample;

use crate::edits::TemplateEdits;
use crate::error::ModifierError;
use crate::template::JobTemplate;

/// Pure function from sample state to template edits
///
/// Implementations must be deterministic for a given sample.
pub trait Modifier: Send + Sync {
    /// Edits for one sample
    fn edits(&self, sample: &Sample) -> TemplateEdits;

    /// Modifier name (for logging/manifests)
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> Modifier for F
where
    F: Fn(&Sample) -> TemplateEdits + Send + Sync,
{
    fn edits(&self, sample: &Sample) -> TemplateEdits {
        self(sample)
    }
}

/// Modifiers applied in registration order
///
/// The chain is itself a [`Modifier`]: its edits are the concatenation of
/// each member's additions and replacements, in order.
#[derive(Default)]
pub struct ModifierChain {
    modifiers: Vec<Box<dyn Modifier>>,
}

impl ModifierChain {
    /// Create empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a modifier appended
    #[must_use]
    pub fn with(mut self, modifier: impl Modifier + 'static) -> Self {
        self.append(modifier);
        self
    }

    /// Append a modifier
    pub fn append(&mut self, modifier: impl Modifier + 'static) {
        self.modifiers.push(Box::new(modifier));
    }

    /// Append an already boxed modifier
    pub fn append_boxed(&mut self, modifier: Box<dyn Modifier>) {
        self.modifiers.push(modifier);
    }

    /// Number of modifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Check if chain is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Member names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.modifiers.iter().map(|m| m.name()).collect()
    }

    /// Edits for one sample, checked against the compiled template
    ///
    /// # Errors
    /// `ModifierError::TemplateDrift` if any replacement targets a missing marker
    pub fn validated_edits(
        &self,
        template: &JobTemplate,
        sample: &Sample,
    ) -> Result<TemplateEdits, ModifierError> {
        let edits = self.edits(sample);
        template.validate(sample.name(), &edits)?;
        tracing::debug!(
            sample = sample.name(),
            additions = edits.additions.len(),
            replacements = edits.replacements.len(),
            "validated template edits"
        );
        Ok(edits)
    }
}

impl Modifier for ModifierChain {
    fn edits(&self, sample: &Sample) -> TemplateEdits {
        self.modifiers
            .iter()
            .fold(TemplateEdits::new(), |mut acc, m| {
                acc.extend(m.edits(sample));
                acc
            })
    }

    fn name(&self) -> &str {
        "chain"
    }
}

impl fmt::Debug for ModifierChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierChain")
            .field("modifiers", &self.names())
            .finish()
    }
}
