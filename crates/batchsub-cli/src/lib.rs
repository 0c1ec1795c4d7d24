//! batchsub command-line front end
//!
//! Loads a run configuration, a sample catalog and a job template, then runs
//! the orchestrator in the requested mode. Submit mode stages job files under
//! the configured output directory.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use batchsub_core::{
    BackendOverride, BatchOrchestrator, DispatchOutcome, ExecutionMode, RunConfig, StagingFactory,
    SubmitError,
};
use batchsub_modifier::JobTemplate;
use batchsub_sample::SampleCatalog;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Catalog file name looked up beside the run config
pub const DEFAULT_CATALOG: &str = "samples.yaml";

/// Default log directive when `RUST_LOG` is unset
pub const DEFAULT_LOG_DIRECTIVE: &str = "batchsub=info";

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Build, inspect or submit one batch run
#[derive(Debug, Clone, Parser)]
#[command(name = "batchsub", version, about)]
pub struct Cli {
    /// Run configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Sample catalog (YAML or JSON) [default: samples.yaml beside the config]
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// build, dry-run (alias testing) or submit
    #[arg(default_value = "build")]
    pub mode: ExecutionMode,

    /// Replace the configured backend override (none, grid or local)
    #[arg(long = "override")]
    pub backend_override: Option<BackendOverride>,

    /// Replace the configured output directory (relative to the working directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Log format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Install the stderr subscriber
///
/// # Errors
/// If a global subscriber is already set or the default directive is invalid
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

impl Cli {
    /// Catalog path, defaulting to `samples.yaml` in the config file's directory
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        match &self.catalog {
            Some(path) => path.clone(),
            None => self
                .config
                .parent()
                .map_or_else(PathBuf::new, Path::to_path_buf)
                .join(DEFAULT_CATALOG),
        }
    }
}

/// Load every input and run the orchestrator
///
/// # Errors
/// Any load, validation or submission failure, with the failing input named
pub fn run(cli: &Cli) -> Result<DispatchOutcome> {
    let mut config = RunConfig::load(&cli.config)
        .with_context(|| format!("loading run config {}", cli.config.display()))?;
    if let Some(backend_override) = cli.backend_override {
        config.backend_override = backend_override;
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir.clone_from(output_dir);
    }

    let catalog_path = cli.catalog_path();
    let catalog = SampleCatalog::load(&catalog_path)
        .with_context(|| format!("loading sample catalog {}", catalog_path.display()))?;
    let template = JobTemplate::load(&config.template)
        .map(Arc::new)
        .with_context(|| format!("loading job template {}", config.template.display()))?;

    tracing::info!(
        batch = %config.batch_name,
        job_type = %config.job_type,
        mode = ?cli.mode,
        samples = catalog.len(),
        template = %template.fingerprint(),
        "starting run"
    );

    let factory = StagingFactory::new(config.output_dir.clone(), Arc::clone(&template));
    let orchestrator = BatchOrchestrator::new(&catalog, &template, config)?;
    let outcome = orchestrator.run(cli.mode, &factory)?;
    Ok(outcome)
}

/// Process exit status for a failed run: 2 for invocation or configuration
/// mistakes, 1 for everything else
#[must_use]
pub fn failure_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SubmitError>() {
        Some(e) if e.is_caller_error() => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_aliases_parse() {
        let cli = Cli::try_parse_from(["batchsub", "-c", "run.toml", "testing"]).unwrap();
        assert_eq!(cli.mode, ExecutionMode::DryRun);
        assert_eq!(cli.catalog, None);
        assert_eq!(cli.catalog_path(), PathBuf::from("samples.yaml"));

        let cli = Cli::try_parse_from(["batchsub", "-c", "run.toml"]).unwrap();
        assert_eq!(cli.mode, ExecutionMode::Build);
        assert!(Cli::try_parse_from(["batchsub", "-c", "run.toml", "launch"]).is_err());
    }

    #[test]
    fn catalog_defaults_beside_config() {
        let cli = Cli::try_parse_from(["batchsub", "-c", "runs/2016/run.toml"]).unwrap();
        assert_eq!(cli.catalog_path(), PathBuf::from("runs/2016/samples.yaml"));

        let cli = Cli::try_parse_from(["batchsub", "-c", "runs/run.toml", "--catalog", "s.json"])
            .unwrap();
        assert_eq!(cli.catalog_path(), PathBuf::from("s.json"));
    }

    #[test]
    fn override_flag_parses() {
        let cli =
            Cli::try_parse_from(["batchsub", "-c", "run.toml", "--override", "crab"]).unwrap();
        assert_eq!(cli.backend_override, Some(BackendOverride::ForceGrid));
        assert!(Cli::try_parse_from(["batchsub", "-c", "r.toml", "--override", "x"]).is_err());
    }

    #[test]
    fn caller_errors_exit_with_two() {
        let err = anyhow::Error::new(SubmitError::InvalidMode("x".to_string())).context("parsing");
        assert_eq!(failure_code(&err), 2);
        let err = anyhow::Error::new(SubmitError::Unsplit("s".to_string()));
        assert_eq!(failure_code(&err), 1);
    }
}
