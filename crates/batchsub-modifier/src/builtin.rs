//! Built-in modifiers

use batchsub_sample::Sample;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::edits::{Replacement, TemplateEdits};
use crate::marker::Marker;
use crate::modifier::Modifier;

/// Flips the simulation flag for recorded-data samples
#[derive(Debug, Clone, Copy, Default)]
pub struct IsMcModifier;

impl Modifier for IsMcModifier {
    fn edits(&self, sample: &Sample) -> TemplateEdits {
        if sample.is_mc() {
            return TemplateEdits::new();
        }
        TemplateEdits::new().with_replacement(Replacement::new(
            Marker::IsMc,
            "is_mc = False",
            format!(
                "trying to submit on data, and template does not contain the magic string \"{}\"",
                Marker::IsMc.text()
            ),
        ))
    }

    fn name(&self) -> &str {
        "is_mc"
    }
}

/// Turns on the special-period code path for samples whose name has a prefix
#[derive(Debug, Clone)]
pub struct SpecialPeriodModifier {
    prefix: String,
}

impl SpecialPeriodModifier {
    /// Prefix of the reference dataset family
    pub const DEFAULT_PREFIX: &'static str = "JetHT2016H";

    /// Create new modifier for a sample-name prefix
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for SpecialPeriodModifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl Modifier for SpecialPeriodModifier {
    fn edits(&self, sample: &Sample) -> TemplateEdits {
        if !sample.name().starts_with(&self.prefix) {
            return TemplateEdits::new();
        }
        TemplateEdits::new().with_replacement(Replacement::new(
            Marker::SpecialPeriod,
            "H = True",
            format!(
                "trying to submit on {} and no magic string \"{}\"",
                self.prefix,
                Marker::SpecialPeriod.text()
            ),
        ))
    }

    fn name(&self) -> &str {
        "special_period"
    }
}

/// Events excluded from one sample
///
/// Entries line up index by index: `runs[i]`, `lumis[i]`, `events[i]`.
/// Without `runs` the veto matches on lumi and event only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VetoList {
    /// Run numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<u32>>,
    /// Luminosity sections
    #[serde(default)]
    pub lumis: Vec<u32>,
    /// Event numbers
    #[serde(default)]
    pub events: Vec<u64>,
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inserts an event-veto filter at the front of a processing path
#[derive(Debug, Clone)]
pub struct EventVetoModifier {
    vetoes: IndexMap<String, VetoList>,
    filter_path: String,
}

impl EventVetoModifier {
    /// Create new modifier for vetoes keyed by sample name
    #[must_use]
    pub fn new(vetoes: IndexMap<String, VetoList>, filter_path: impl Into<String>) -> Self {
        Self {
            vetoes,
            filter_path: filter_path.into(),
        }
    }

    /// Processing path the filter is inserted into
    #[inline]
    #[must_use]
    pub fn filter_path(&self) -> &str {
        &self.filter_path
    }

    fn block(&self, veto: &VetoList) -> String {
        let mut text = String::from(
            "\nprocess.eventVeto = cms.EDFilter('EventIdVeto',\n                                 list_fn = cms.string(''),\n",
        );
        match &veto.runs {
            Some(runs) => {
                text.push_str("                                 use_run = cms.bool(True),\n");
                text.push_str(&format!(
                    "                                 runs = cms.vuint32({}),\n",
                    join(runs)
                ));
            }
            None => text.push_str("                                 use_run = cms.bool(False),\n"),
        }
        text.push_str(&format!(
            "                                 lumis = cms.vuint32({}),\n",
            join(&veto.lumis)
        ));
        text.push_str(&format!(
            "                                 events = cms.vuint64({}))\n",
            join(&veto.events)
        ));
        text.push_str(&format!(
            "process.{}.insert(0, process.eventVeto)\n",
            self.filter_path
        ));
        text
    }
}

impl Modifier for EventVetoModifier {
    fn edits(&self, sample: &Sample) -> TemplateEdits {
        match self.vetoes.get(sample.name()) {
            Some(veto) => TemplateEdits::new().with_addition(self.block(veto)),
            None => TemplateEdits::new(),
        }
    }

    fn name(&self) -> &str {
        "event_veto"
    }
}

/// Caps the number of output events per job
#[derive(Debug, Clone, Copy)]
pub struct MaxOutputModifier {
    n: u64,
}

impl MaxOutputModifier {
    /// Create new modifier
    #[inline]
    #[must_use]
    pub fn new(n: u64) -> Self {
        Self { n }
    }
}

impl Modifier for MaxOutputModifier {
    fn edits(&self, _sample: &Sample) -> TemplateEdits {
        TemplateEdits::new().with_addition(format!(
            "process.maxEvents.output = cms.untracked.int32({})",
            self.n
        ))
    }

    fn name(&self) -> &str {
        "max_output"
    }
}

/// Removes processing paths from recorded-data jobs
#[derive(Debug, Clone)]
pub struct DropPathsOnData {
    paths: Vec<String>,
}

impl DropPathsOnData {
    /// Create new modifier for the given path names
    #[must_use]
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl Modifier for DropPathsOnData {
    fn edits(&self, sample: &Sample) -> TemplateEdits {
        if sample.is_mc() {
            return TemplateEdits::new();
        }
        self.paths
            .iter()
            .fold(TemplateEdits::new(), |edits, path| {
                edits.with_addition(format!(
                    "if hasattr(process, '{path}'):\n    del process.{path}\n"
                ))
            })
    }

    fn name(&self) -> &str {
        "drop_paths_on_data"
    }
}
