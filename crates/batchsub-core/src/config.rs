//! Run configuration
//!
//! Provides [`RunConfig`], loaded from TOML, and the keyword sections that
//! resolve into per-backend [`ResolvedKwargs`].

use std::path::{Path, PathBuf};

use batchsub_modifier::ModifierSpec;
use batchsub_sample::{LumiFilter, DEFAULT_DATASET};
use batchsub_splitting::{JobType, JobTypeTable, SplittingPolicy, UNIFORM_DEFAULT_FILES_PER};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SubmitError;
use crate::types::{Backend, BackendOverride, StageOut};

/// One keyword section (`[common]`, `[grid]` or `[pool]`)
///
/// Unset keys fall through to the section underneath.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KwargsConfig {
    /// Dataset variant key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Extra classification tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ex: Option<String>,
    /// Derive job-control parameters from each sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_control_from_sample: Option<bool>,
    /// Stage-out policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stageout_files: Option<StageOut>,
    /// Modifier chain, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<Vec<ModifierSpec>>,
    /// Per-sample job ceiling; `0` means unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_jobs: Option<u64>,
    /// Backend-specific pass-through keys
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, JsonValue>,
}

impl KwargsConfig {
    /// Create empty section
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a more specific section over this one; its set keys win
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut extra = self.extra.clone();
        extra.extend(other.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            dataset: other.dataset.clone().or_else(|| self.dataset.clone()),
            ex: other.ex.clone().or_else(|| self.ex.clone()),
            job_control_from_sample: other
                .job_control_from_sample
                .or(self.job_control_from_sample),
            stageout_files: other.stageout_files.or(self.stageout_files),
            modifiers: other.modifiers.clone().or_else(|| self.modifiers.clone()),
            max_jobs: other.max_jobs.or(self.max_jobs),
            extra,
        }
    }

    /// With dataset key
    #[inline]
    #[must_use]
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// With classification tag
    #[inline]
    #[must_use]
    pub fn with_ex(mut self, ex: impl Into<String>) -> Self {
        self.ex = Some(ex.into());
        self
    }

    /// With stage-out policy
    #[inline]
    #[must_use]
    pub fn with_stageout(mut self, stageout: StageOut) -> Self {
        self.stageout_files = Some(stageout);
        self
    }

    /// With modifier chain
    #[inline]
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Vec<ModifierSpec>) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    /// With job ceiling
    #[inline]
    #[must_use]
    pub fn with_max_jobs(mut self, max_jobs: u64) -> Self {
        self.max_jobs = Some(max_jobs);
        self
    }

    /// With a pass-through key
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Fully resolved keywords for one backend submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedKwargs {
    /// Dataset variant key
    pub dataset: String,
    /// Extra classification tag
    pub ex: String,
    /// Hand each sample's resolved splitting to the backend (default); when
    /// false the backend applies its own job control and ceilings are not checked
    pub job_control_from_sample: bool,
    /// Stage-out policy
    pub stageout_files: StageOut,
    /// Modifier chain, in order
    pub modifiers: Vec<ModifierSpec>,
    /// Per-sample job ceiling
    ///
    /// Only checked for samples whose job count can be estimated, i.e. whose
    /// current variant declares file (or event) counts.
    pub max_jobs: Option<u64>,
    /// Backend-specific pass-through keys
    pub extra: IndexMap<String, JsonValue>,
}

impl ResolvedKwargs {
    /// Merge the backend section over the common one and fill defaults
    #[must_use]
    pub fn resolve(
        common: &KwargsConfig,
        specific: &KwargsConfig,
        backend: Backend,
        run_dataset: &str,
    ) -> Self {
        let merged = common.merge(specific);
        let max_jobs = match merged.max_jobs {
            Some(0) => None,
            Some(n) => Some(n),
            None => backend.default_max_jobs(),
        };
        Self {
            dataset: merged.dataset.unwrap_or_else(|| run_dataset.to_string()),
            ex: merged.ex.unwrap_or_default(),
            job_control_from_sample: merged.job_control_from_sample.unwrap_or(true),
            stageout_files: merged.stageout_files.unwrap_or_default(),
            modifiers: merged.modifiers.unwrap_or_default(),
            max_jobs,
            extra: merged.extra,
        }
    }
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

fn default_files_per() -> u64 {
    UNIFORM_DEFAULT_FILES_PER
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("batches")
}

/// Whole-run configuration
///
/// ```toml
/// batch_name = "NtupleV20"
/// job_type = "ntuple"
/// samples = ["data_2016", "qcd_2016"]
/// template = "ntuple.py"
///
/// [common]
/// ex = "2016"
///
/// [pool]
/// stageout_files = "all"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Name shared by every backend batch of the run
    pub batch_name: String,
    /// Job type name
    pub job_type: String,
    /// Dataset variant key
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Lumi filter for recorded-data samples; relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lumi_filter: Option<LumiFilter>,
    /// Backend override
    #[serde(default, rename = "override")]
    pub backend_override: BackendOverride,
    /// Files per job for the `default` job type
    #[serde(default = "default_files_per")]
    pub default_files_per: u64,
    /// Catalog selectors; empty selects the whole catalog
    #[serde(default)]
    pub samples: Vec<String>,
    /// Job template path; relative to the config file
    pub template: PathBuf,
    /// Root for staged batch directories; relative to the config file
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Keywords shared by both backends
    #[serde(default)]
    pub common: KwargsConfig,
    /// Grid-only keywords
    #[serde(default)]
    pub grid: KwargsConfig,
    /// Local-pool-only keywords
    #[serde(default)]
    pub pool: KwargsConfig,
    /// Splitting-table overlays keyed by job type name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub splitting: IndexMap<String, JobTypeTable>,
}

impl RunConfig {
    /// Create minimal configuration
    #[must_use]
    pub fn new(
        batch_name: impl Into<String>,
        job_type: impl Into<String>,
        template: impl Into<PathBuf>,
    ) -> Self {
        Self {
            batch_name: batch_name.into(),
            job_type: job_type.into(),
            dataset: default_dataset(),
            lumi_filter: None,
            backend_override: BackendOverride::None,
            default_files_per: UNIFORM_DEFAULT_FILES_PER,
            samples: Vec::new(),
            template: template.into(),
            output_dir: default_output_dir(),
            common: KwargsConfig::default(),
            grid: KwargsConfig::default(),
            pool: KwargsConfig::default(),
            splitting: IndexMap::new(),
        }
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `ConfigParse` on malformed input, `InvalidConfig` on inconsistent values
    pub fn from_toml(text: &str) -> Result<Self, SubmitError> {
        let config: Self = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Load a TOML file
    ///
    /// Relative `template`, `lumi_filter` and `output_dir` paths are taken
    /// from the file's directory, so a run behaves the same from any working
    /// directory. [`RunConfig::from_toml`] leaves them as written.
    ///
    /// # Errors
    /// As for [`RunConfig::from_toml`], plus `Io` if the file cannot be read
    pub fn load(path: &Path) -> Result<Self, SubmitError> {
        let text = std::fs::read_to_string(path).map_err(|e| SubmitError::io(path, e))?;
        let mut config = Self::from_toml(&text)?;
        if let Some(dir) = path.parent() {
            config.rebase(dir);
        }
        tracing::debug!(path = %path.display(), batch = %config.batch_name, "loaded run config");
        Ok(config)
    }

    fn rebase(&mut self, dir: &Path) {
        let rebased = |p: &Path| {
            if p.is_relative() {
                dir.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.template = rebased(&self.template);
        self.output_dir = rebased(&self.output_dir);
        if let Some(filter) = &self.lumi_filter {
            self.lumi_filter = Some(LumiFilter::new(rebased(filter.path())));
        }
    }

    fn check(&self) -> Result<(), SubmitError> {
        if self.batch_name.trim().is_empty() {
            return Err(SubmitError::InvalidConfig("batch_name is empty".to_string()));
        }
        if self.batch_name.contains("..")
            || self
                .batch_name
                .contains(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(SubmitError::InvalidConfig(format!(
                "batch_name {:?} must not contain path separators, `..` or whitespace",
                self.batch_name
            )));
        }
        if self.default_files_per == 0 {
            return Err(SubmitError::InvalidConfig(
                "default_files_per must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed job type
    ///
    /// # Errors
    /// `SplittingError::UnknownJobType` for an unrecognized name
    pub fn job_type(&self) -> Result<JobType, SubmitError> {
        Ok(self.job_type.parse()?)
    }

    /// Reference splitting policy with this run's overlays and defaults
    ///
    /// # Errors
    /// `SplittingError::UnknownJobType` for an overlay keyed by an unknown name
    pub fn policy(&self) -> Result<SplittingPolicy, SubmitError> {
        let mut policy =
            SplittingPolicy::reference().with_default_files_per(self.default_files_per);
        for (name, table) in &self.splitting {
            let job_type: JobType = name.parse()?;
            policy = policy.with_table(job_type, table);
        }
        Ok(policy)
    }

    /// Keyword section for a backend
    #[inline]
    #[must_use]
    pub fn section(&self, backend: Backend) -> &KwargsConfig {
        match backend {
            Backend::Grid => &self.grid,
            Backend::Pool => &self.pool,
        }
    }

    /// Resolved keywords for a backend
    #[must_use]
    pub fn kwargs(&self, backend: Backend) -> ResolvedKwargs {
        ResolvedKwargs::resolve(&self.common, self.section(backend), backend, &self.dataset)
    }
}
