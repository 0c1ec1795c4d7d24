//! batchsub Modifier Chain
//!
//! Specializes a shared job template per sample with ordered text additions
//! and marker replacements, validated against the compiled template.
//!
//! # Core Concepts
//!
//! - [`Marker`]: closed set of named insertion points
//! - [`JobTemplate`]: template text compiled once, with its markers and fingerprint
//! - [`TemplateEdits`]: additions and replacements for one sample
//! - [`Modifier`]: pure function from sample to edits
//! - [`ModifierChain`]: modifiers applied in registration order
//! - [`ModifierSpec`]: declarative configuration for the built-in modifiers
//!
//! # Example
//!
//! ```rust
//! use batchsub_modifier::{IsMcModifier, JobTemplate, Modifier, ModifierChain, SpecialPeriodModifier};
//! use batchsub_sample::Sample;
//!
//! let template = JobTemplate::compile("is_mc = True\nH = False\n");
//! let chain = ModifierChain::new()
//!     .with(IsMcModifier)
//!     .with(SpecialPeriodModifier::default());
//!
//! let sample = Sample::recorded("JetHT2016H2");
//! let edits = chain.validated_edits(&template, &sample).unwrap();
//! let job = template.render(sample.name(), &edits).unwrap();
//! assert_eq!(job, "is_mc = False\nH = True\n");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builtin;
mod edits;
mod error;
mod marker;
mod modifier;
mod spec;
mod template;

pub use builtin::{
    DropPathsOnData, EventVetoModifier, IsMcModifier, MaxOutputModifier, SpecialPeriodModifier,
    VetoList,
};
pub use edits::{Replacement, TemplateEdits};
pub use error::ModifierError;
pub use marker::Marker;
pub use modifier::{Modifier, ModifierChain};
pub use spec::ModifierSpec;
pub use template::JobTemplate;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
