//! Declarative modifier configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::builtin::{
    DropPathsOnData, EventVetoModifier, IsMcModifier, MaxOutputModifier, SpecialPeriodModifier,
    VetoList,
};
use crate::error::ModifierError;
use crate::modifier::{Modifier, ModifierChain};

/// Largest cap the job's signed 32-bit counter holds
const MAX_OUTPUT_EVENTS: u64 = 2_147_483_647;

fn default_prefix() -> String {
    SpecialPeriodModifier::DEFAULT_PREFIX.to_string()
}

/// One configured modifier, tagged by `kind`
///
/// ```toml
/// [[common.modifiers]]
/// kind = "max_output"
/// n = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModifierSpec {
    /// [`IsMcModifier`]
    IsMc,
    /// [`SpecialPeriodModifier`]
    SpecialPeriod {
        /// Sample-name prefix
        #[serde(default = "default_prefix")]
        prefix: String,
    },
    /// [`EventVetoModifier`]
    EventVeto {
        /// Processing path to guard
        filter_path: String,
        /// Vetoes keyed by sample name
        #[serde(default)]
        vetoes: IndexMap<String, VetoList>,
    },
    /// [`MaxOutputModifier`]
    MaxOutput {
        /// Output-event cap
        n: u64,
    },
    /// [`DropPathsOnData`]
    DropPathsOnData {
        /// Paths removed from recorded-data jobs
        paths: Vec<String>,
    },
}

impl ModifierSpec {
    /// Configuration tag
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IsMc => "is_mc",
            Self::SpecialPeriod { .. } => "special_period",
            Self::EventVeto { .. } => "event_veto",
            Self::MaxOutput { .. } => "max_output",
            Self::DropPathsOnData { .. } => "drop_paths_on_data",
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ModifierError {
        ModifierError::InvalidSpec {
            kind: self.kind(),
            reason: reason.into(),
        }
    }

    /// Build the configured modifier
    ///
    /// # Errors
    /// `ModifierError::InvalidSpec` for empty names, an out-of-range cap, or
    /// veto lists whose columns differ in length
    pub fn build(&self) -> Result<Box<dyn Modifier>, ModifierError> {
        Ok(match self {
            Self::IsMc => Box::new(IsMcModifier),
            Self::SpecialPeriod { prefix } => {
                if prefix.is_empty() {
                    return Err(self.invalid("prefix must not be empty"));
                }
                Box::new(SpecialPeriodModifier::new(prefix.clone()))
            }
            Self::EventVeto {
                filter_path,
                vetoes,
            } => {
                if filter_path.is_empty() {
                    return Err(self.invalid("filter_path must not be empty"));
                }
                for (sample, veto) in vetoes {
                    let runs = veto.runs.as_ref().map_or(veto.lumis.len(), Vec::len);
                    if veto.lumis.len() != veto.events.len() || runs != veto.lumis.len() {
                        return Err(self.invalid(format!(
                            "veto columns for {sample} differ in length"
                        )));
                    }
                }
                Box::new(EventVetoModifier::new(vetoes.clone(), filter_path.clone()))
            }
            Self::MaxOutput { n } => {
                if *n == 0 || *n > MAX_OUTPUT_EVENTS {
                    return Err(self.invalid(format!(
                        "n must be in 1..={MAX_OUTPUT_EVENTS}, got {n}"
                    )));
                }
                Box::new(MaxOutputModifier::new(*n))
            }
            Self::DropPathsOnData { paths } => {
                if paths.is_empty() || paths.iter().any(String::is_empty) {
                    return Err(self.invalid("paths must be non-empty names"));
                }
                Box::new(DropPathsOnData::new(paths.iter().cloned()))
            }
        })
    }

    /// Build a chain from specs, preserving their order
    ///
    /// # Errors
    /// The first spec that fails to build
    pub fn chain(specs: &[ModifierSpec]) -> Result<ModifierChain, ModifierError> {
        let mut chain = ModifierChain::new();
        for spec in specs {
            chain.append_boxed(spec.build()?);
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchsub_sample::Sample;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        modifiers: Vec<ModifierSpec>,
    }

    #[test]
    fn parse_and_build_from_toml() {
        let text = r#"
[[modifiers]]
kind = "is_mc"

[[modifiers]]
kind = "special_period"

[[modifiers]]
kind = "event_veto"
filter_path = "pSkimSel"
[modifiers.vetoes.JetHT2016C]
runs = [275000]
lumis = [12]
events = [99]

[[modifiers]]
kind = "max_output"
n = 500
"#;
        let w: Wrapper = toml::from_str(text).unwrap();
        assert_eq!(w.modifiers.len(), 4);
        assert_eq!(
            w.modifiers[1],
            ModifierSpec::SpecialPeriod {
                prefix: "JetHT2016H".to_string()
            }
        );

        let chain = ModifierSpec::chain(&w.modifiers).unwrap();
        assert_eq!(
            chain.names(),
            vec!["is_mc", "special_period", "event_veto", "max_output"]
        );

        let edits = chain.edits(&Sample::recorded("JetHT2016C"));
        assert_eq!(edits.replacements.len(), 1);
        assert_eq!(edits.additions.len(), 2);
    }

    #[test]
    fn invalid_specs_rejected() {
        assert!(ModifierSpec::MaxOutput { n: 0 }.build().is_err());
        assert!(ModifierSpec::DropPathsOnData { paths: vec![] }
            .build()
            .is_err());

        let mut vetoes = IndexMap::new();
        vetoes.insert(
            "s".to_string(),
            VetoList {
                runs: None,
                lumis: vec![1, 2],
                events: vec![3],
            },
        );
        let err = ModifierSpec::EventVeto {
            filter_path: "p".to_string(),
            vetoes,
        }
        .build()
        .err()
        .unwrap();
        assert!(matches!(err, ModifierError::InvalidSpec { kind: "event_veto", .. }));
    }
}
