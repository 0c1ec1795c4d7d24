//! File-staging submitter
//!
//! Provides [`StagingSubmitter`], which writes one rendered job file per sample
//! and a `manifest.json` under `<output_dir>/<backend>/<batch_name>/`. Handing
//! the staged directory to a scheduler is left to the backend tooling.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use batchsub_modifier::{JobTemplate, ModifierChain, ModifierSpec};
use batchsub_sample::{Sample, SampleError, Splitting};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::config::ResolvedKwargs;
use crate::error::SubmitError;
use crate::submitter::{Submitter, SubmitterFactory};
use crate::types::{Backend, SubmissionReceipt};

/// Name of the manifest written into each batch directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Extension of rendered job files
pub const JOB_FILE_EXTENSION: &str = "job";

/// Who decides how a batch is cut into jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum JobControl {
    /// Each sample's resolved splitting
    Sample,
    /// The backend's own defaults
    Backend,
}

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    name: &'a str,
    is_mc: bool,
    dataset: &'a str,
    #[serde(flatten)]
    splitting: Option<Splitting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_jobs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lumi_filter: Option<String>,
    job_file: String,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    batch_id: Ulid,
    batch_name: &'a str,
    backend: Backend,
    staged_at: DateTime<Utc>,
    template_fingerprint: &'a str,
    job_control: JobControl,
    modifiers: Vec<&'a str>,
    kwargs: &'a ResolvedKwargs,
    samples: Vec<ManifestEntry<'a>>,
}

/// Job file name for a sample; always a single component inside the batch directory
fn job_file_name(sample: &Sample) -> Result<String, SubmitError> {
    let name = sample.name();
    let file = format!("{name}.{JOB_FILE_EXTENSION}");
    let mut components = Path::new(&file).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || name.is_empty() || name.contains('\\') || name.contains("..") {
        return Err(SampleError::InvalidName {
            name: name.to_string(),
            reason: "job file would leave the batch directory",
        }
        .into());
    }
    Ok(file)
}

/// Writes staged job directories for one backend batch
///
/// The batch is written into a hidden sibling directory and renamed into
/// place once complete; a failed write leaves no batch directory behind.
#[derive(Debug)]
pub struct StagingSubmitter {
    backend: Backend,
    batch_name: String,
    kwargs: ResolvedKwargs,
    template: Arc<JobTemplate>,
    chain: ModifierChain,
    batch_dir: PathBuf,
}

impl StagingSubmitter {
    /// Create new submitter
    ///
    /// # Errors
    /// `ModifierError::InvalidSpec` if the configured modifiers cannot be built
    pub fn new(
        output_dir: &Path,
        backend: Backend,
        batch_name: &str,
        kwargs: &ResolvedKwargs,
        template: Arc<JobTemplate>,
    ) -> Result<Self, SubmitError> {
        let chain = ModifierSpec::chain(&kwargs.modifiers)?;
        Ok(Self {
            backend,
            batch_name: batch_name.to_string(),
            kwargs: kwargs.clone(),
            template,
            chain,
            batch_dir: output_dir.join(backend.as_str()).join(batch_name),
        })
    }

    /// Directory this batch is staged into
    #[inline]
    #[must_use]
    pub fn batch_dir(&self) -> &Path {
        &self.batch_dir
    }

    fn job_control(&self) -> JobControl {
        if self.kwargs.job_control_from_sample {
            JobControl::Sample
        } else {
            JobControl::Backend
        }
    }

    fn write(path: &Path, contents: &[u8]) -> Result<(), SubmitError> {
        fs::write(path, contents).map_err(|e| SubmitError::io(path, e))
    }

    fn write_batch(
        &self,
        dir: &Path,
        rendered: &[(&Sample, String, String)],
        receipt: &SubmissionReceipt,
    ) -> Result<(), SubmitError> {
        fs::create_dir_all(dir).map_err(|e| SubmitError::io(dir, e))?;

        let job_control = self.job_control();
        let mut entries = Vec::with_capacity(rendered.len());
        for (sample, job_file, text) in rendered {
            Self::write(&dir.join(job_file), text.as_bytes())?;
            let from_sample = job_control == JobControl::Sample;
            entries.push(ManifestEntry {
                name: sample.name(),
                is_mc: sample.is_mc(),
                dataset: sample.curr_dataset(),
                splitting: sample.splitting().copied().filter(|_| from_sample),
                estimated_jobs: sample.estimated_jobs().filter(|_| from_sample),
                lumi_filter: sample.lumi_filter().map(ToString::to_string),
                job_file: job_file.clone(),
            });
        }

        let manifest = Manifest {
            batch_id: receipt.batch_id,
            batch_name: &self.batch_name,
            backend: self.backend,
            staged_at: Utc::now(),
            template_fingerprint: self.template.fingerprint(),
            job_control,
            modifiers: self.chain.names(),
            kwargs: &self.kwargs,
            samples: entries,
        };
        let json = serde_json::to_vec_pretty(&manifest)?;
        Self::write(&dir.join(MANIFEST_FILE), &json)
    }

    fn discard(dir: &Path) {
        if let Err(e) = fs::remove_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to remove partial batch");
        }
    }
}

impl Submitter for StagingSubmitter {
    fn submit_all(&mut self, samples: &[Sample]) -> Result<SubmissionReceipt, SubmitError> {
        if self.batch_dir.exists() {
            return Err(SubmitError::backend(
                self.backend,
                format!("batch directory {} already exists", self.batch_dir.display()),
            ));
        }

        // nothing is written until every sample renders
        let mut rendered = Vec::with_capacity(samples.len());
        for sample in samples {
            if sample.splitting().is_none() {
                return Err(SubmitError::Unsplit(sample.name().to_string()));
            }
            let job_file = job_file_name(sample)?;
            let edits = self.chain.validated_edits(&self.template, sample)?;
            let text = self.template.render(sample.name(), &edits)?;
            rendered.push((sample, job_file, text));
        }

        let mut receipt = SubmissionReceipt::for_batch(&self.batch_name, self.backend, samples)
            .with_location(&self.batch_dir);
        if self.job_control() == JobControl::Backend {
            receipt.jobs = 0;
        }

        let partial = self
            .batch_dir
            .with_file_name(format!(".{}.{}.partial", self.batch_name, receipt.batch_id));
        let staged = self.write_batch(&partial, &rendered, &receipt).and_then(|()| {
            fs::rename(&partial, &self.batch_dir).map_err(|e| SubmitError::io(&self.batch_dir, e))
        });
        if let Err(e) = staged {
            Self::discard(&partial);
            return Err(e);
        }

        tracing::info!(
            backend = %self.backend,
            batch = %self.batch_name,
            batch_id = %receipt.batch_id,
            samples = samples.len(),
            jobs = receipt.jobs,
            job_control = ?self.job_control(),
            dir = %self.batch_dir.display(),
            "staged batch"
        );
        Ok(receipt)
    }
}

/// Builds [`StagingSubmitter`]s for both backends
#[derive(Debug, Clone)]
pub struct StagingFactory {
    output_dir: PathBuf,
    template: Arc<JobTemplate>,
}

impl StagingFactory {
    /// Create new factory
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, template: Arc<JobTemplate>) -> Self {
        Self {
            output_dir: output_dir.into(),
            template,
        }
    }
}

impl SubmitterFactory for StagingFactory {
    fn create(
        &self,
        backend: Backend,
        batch_name: &str,
        kwargs: &ResolvedKwargs,
    ) -> Result<Box<dyn Submitter>, SubmitError> {
        let submitter = StagingSubmitter::new(
            &self.output_dir,
            backend,
            batch_name,
            kwargs,
            Arc::clone(&self.template),
        )?;
        Ok(Box::new(submitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KwargsConfig;
    use batchsub_sample::{DatasetVariant, LumiFilter, SplitBy};
    use pretty_assertions::assert_eq;

    fn split(mut sample: Sample) -> Sample {
        let s = Splitting::new(sample.name(), SplitBy::Files, 1, 10).unwrap();
        sample.set_splitting(s);
        sample
    }

    fn kwargs() -> ResolvedKwargs {
        let common = KwargsConfig::new().with_modifiers(vec![ModifierSpec::IsMc]);
        ResolvedKwargs::resolve(&common, &KwargsConfig::new(), Backend::Pool, "main")
    }

    #[test]
    fn stages_jobs_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let template = Arc::new(JobTemplate::compile("is_mc = True\n"));
        let mut data = split(
            Sample::recorded("JetHT2016C")
                .with_dataset("main", DatasetVariant::new().with_files(25)),
        );
        data.set_lumi_filter(LumiFilter::new("golden.json")).unwrap();
        let samples = vec![split(Sample::simulation("ttbar", 100)), data];

        let mut submitter =
            StagingSubmitter::new(dir.path(), Backend::Pool, "HistosV1", &kwargs(), template)
                .unwrap();
        let receipt = submitter.submit_all(&samples).unwrap();

        let batch_dir = dir.path().join("pool").join("HistosV1");
        assert_eq!(receipt.location.as_deref(), Some(batch_dir.as_path()));
        assert_eq!(receipt.samples, vec!["ttbar", "JetHT2016C"]);
        assert_eq!(receipt.jobs, 3);

        assert_eq!(
            fs::read_to_string(batch_dir.join("ttbar.job")).unwrap(),
            "is_mc = True\n"
        );
        assert_eq!(
            fs::read_to_string(batch_dir.join("JetHT2016C.job")).unwrap(),
            "is_mc = False\n"
        );

        let manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(batch_dir.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest["batch_name"], "HistosV1");
        assert_eq!(manifest["backend"], "pool");
        assert_eq!(manifest["modifiers"][0], "is_mc");
        assert_eq!(manifest["samples"][1]["lumi_filter"], "golden.json");
        assert_eq!(manifest["samples"][1]["estimated_jobs"], 3);
        assert!(manifest["samples"][0].get("lumi_filter").is_none());
        assert!(manifest["staged_at"].is_string());
    }

    #[test]
    fn refuses_existing_batch_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("grid").join("B")).unwrap();
        let template = Arc::new(JobTemplate::compile("x\n"));
        let mut submitter =
            StagingSubmitter::new(dir.path(), Backend::Grid, "B", &kwargs(), template).unwrap();

        let err = submitter
            .submit_all(&[split(Sample::simulation("ttbar", 1))])
            .unwrap_err();
        assert!(matches!(err, SubmitError::Backend { backend: Backend::Grid, .. }));
    }

    #[test]
    fn drift_leaves_nothing_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let template = Arc::new(JobTemplate::compile("no flag here\n"));
        let mut submitter =
            StagingSubmitter::new(dir.path(), Backend::Pool, "B", &kwargs(), template).unwrap();

        let err = submitter
            .submit_all(&[split(Sample::recorded("JetHT2016C"))])
            .unwrap_err();
        assert!(matches!(err, SubmitError::Modifier(_)));
        assert!(!dir.path().join("pool").exists());
    }

    #[test]
    fn unsplit_sample_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let template = Arc::new(JobTemplate::compile("is_mc = True\n"));
        let factory = StagingFactory::new(dir.path(), template);
        let mut submitter = factory.create(Backend::Pool, "B", &kwargs()).unwrap();

        let err = submitter
            .submit_all(&[Sample::simulation("ttbar", 1)])
            .unwrap_err();
        assert!(matches!(err, SubmitError::Unsplit(ref s) if s == "ttbar"));
    }

    #[test]
    fn escaping_sample_name_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let template = Arc::new(JobTemplate::compile("is_mc = True\n"));
        let mut submitter =
            StagingSubmitter::new(&out, Backend::Pool, "B", &kwargs(), template).unwrap();

        for name in ["../../escaped", "sub/x", "..", "a\\b"] {
            let err = submitter
                .submit_all(&[split(Sample::simulation(name, 1))])
                .unwrap_err();
            assert!(
                matches!(err, SubmitError::Sample(SampleError::InvalidName { .. })),
                "{name:?}: {err}"
            );
        }
        assert!(!out.exists());
        assert!(!dir.path().join("escaped.job").exists());
    }

    #[test]
    fn failed_write_leaves_no_batch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let template = Arc::new(JobTemplate::compile("is_mc = True\n"));
        let mut submitter =
            StagingSubmitter::new(dir.path(), Backend::Pool, "B", &kwargs(), template).unwrap();

        // longer than any file-name limit
        let long = "x".repeat(300);
        let samples = [
            split(Sample::simulation("aaa", 1)),
            split(Sample::simulation(long.as_str(), 1)),
        ];
        let err = submitter.submit_all(&samples).unwrap_err();
        assert!(matches!(err, SubmitError::Io { .. }));

        let pool = dir.path().join("pool");
        assert!(!pool.join("B").exists());
        assert_eq!(fs::read_dir(&pool).unwrap().count(), 0);

        // the batch name stays usable
        let receipt = submitter.submit_all(&samples[..1]).unwrap();
        assert_eq!(receipt.samples, vec!["aaa"]);
        assert!(pool.join("B").join("aaa.job").is_file());
    }

    #[test]
    fn backend_job_control_omits_sample_splitting() {
        let dir = tempfile::tempdir().unwrap();
        let template = Arc::new(JobTemplate::compile("is_mc = True\n"));
        let pool = KwargsConfig {
            job_control_from_sample: Some(false),
            ..KwargsConfig::new()
        };
        let kwargs = ResolvedKwargs::resolve(&KwargsConfig::new(), &pool, Backend::Pool, "main");
        let mut submitter =
            StagingSubmitter::new(dir.path(), Backend::Pool, "B", &kwargs, template).unwrap();

        let sample = split(
            Sample::simulation("ttbar", 100)
                .with_dataset("main", DatasetVariant::new().with_files(25)),
        );
        let receipt = submitter.submit_all(&[sample]).unwrap();
        assert_eq!(receipt.jobs, 0);

        let manifest: serde_json::Value = serde_json::from_slice(
            &fs::read(dir.path().join("pool").join("B").join(MANIFEST_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["job_control"], "backend");
        let entry = &manifest["samples"][0];
        assert_eq!(entry["job_file"], "ttbar.job");
        assert!(entry.get("files_per").is_none());
        assert!(entry.get("split_by").is_none());
        assert!(entry.get("estimated_jobs").is_none());
    }

    #[test]
    fn sample_job_control_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let template = Arc::new(JobTemplate::compile("is_mc = True\n"));
        let mut submitter =
            StagingSubmitter::new(dir.path(), Backend::Grid, "B", &kwargs(), template).unwrap();
        submitter
            .submit_all(&[split(Sample::simulation("ttbar", 1))])
            .unwrap();

        let manifest: serde_json::Value = serde_json::from_slice(
            &fs::read(dir.path().join("grid").join("B").join(MANIFEST_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["job_control"], "sample");
        assert_eq!(manifest["samples"][0]["split_by"], "files");
        assert_eq!(manifest["samples"][0]["files_per"], 10);
    }
}
