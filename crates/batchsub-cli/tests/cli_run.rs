use std::fs;
use std::path::Path;

use batchsub_cli::{failure_code, run, Cli};
use batchsub_core::{Backend, DispatchOutcome, MANIFEST_FILE};
use batchsub_test_utils::REFERENCE_TEMPLATE;
use clap::Parser;
use pretty_assertions::assert_eq;

const CATALOG: &str = "\
samples:
  - name: ttbar
    kind: simulation
    nevents: 38000
    datasets:
      main: { nfiles: 40 }
  - name: JetHT2016H2
    kind: recorded
    condor: true
    datasets:
      main: { nfiles: 10 }
groups:
  all_2016: [ttbar, JetHT2016H2]
";

fn workspace(config: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("run.toml"), config).unwrap();
    fs::write(dir.path().join("samples.yaml"), CATALOG).unwrap();
    fs::write(dir.path().join("histos.py"), REFERENCE_TEMPLATE).unwrap();
    dir
}

fn cli(dir: &Path, extra: &[&str]) -> Cli {
    let config = dir.join("run.toml");
    let catalog = dir.join("samples.yaml");
    let mut args = vec![
        "batchsub".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--catalog".to_string(),
        catalog.display().to_string(),
    ];
    args.extend(extra.iter().map(ToString::to_string));
    Cli::try_parse_from(args).unwrap()
}

const RUN: &str = r#"
batch_name = "HistosV1"
job_type = "histos"
samples = ["all_2016"]
template = "histos.py"

[common]
modifiers = [{ kind = "is_mc" }, { kind = "special_period" }]
"#;

#[test]
fn dry_run_prints_routing() {
    let dir = workspace(RUN);
    let outcome = run(&cli(dir.path(), &["dry-run"])).unwrap();
    assert_eq!(
        outcome.to_string(),
        "HistosV1: grid samples =\n  ttbar\nHistosV1: pool samples =\n  JetHT2016H2\n"
    );
}

#[test]
fn submit_stages_under_output_dir() {
    let dir = workspace(RUN);
    let out = dir.path().join("staged");
    let args = ["submit", "--output-dir", out.to_str().unwrap()];
    let DispatchOutcome::Submitted(receipts) = run(&cli(dir.path(), &args)).unwrap() else {
        panic!("expected receipts");
    };
    assert_eq!(receipts.len(), 2);
    assert_eq!(receipts[1].backend, Backend::Pool);

    let job = fs::read_to_string(out.join("pool/HistosV1/JetHT2016H2.job")).unwrap();
    assert!(job.contains("is_mc = False\n"));
    assert!(job.contains("H = True\n"));
    assert!(out.join("grid/HistosV1").join(MANIFEST_FILE).is_file());

    // a second submit of the same batch name is refused
    let err = run(&cli(dir.path(), &args)).unwrap_err();
    assert_eq!(failure_code(&err), 1);
}

#[test]
fn override_flag_beats_config() {
    let dir = workspace(RUN);
    let DispatchOutcome::DryRun(report) =
        run(&cli(dir.path(), &["dry-run", "--override", "grid"])).unwrap()
    else {
        panic!("expected routing report");
    };
    assert_eq!(report.names(Backend::Grid), ["ttbar", "JetHT2016H2"]);
    assert!(report.names(Backend::Pool).is_empty());
}

#[test]
fn bad_job_type_is_a_caller_error() {
    let dir = workspace(&RUN.replace("histos\"", "pileup\""));
    let err = run(&cli(dir.path(), &[])).unwrap_err();
    assert_eq!(failure_code(&err), 2);
    assert!(format!("{err:#}").contains("pileup"));
}

#[test]
fn paths_follow_the_config_directory() {
    let dir = workspace(RUN);
    let config = dir.path().join("run.toml");
    let cli = Cli::try_parse_from(["batchsub", "-c", config.to_str().unwrap(), "submit"]).unwrap();
    let DispatchOutcome::Submitted(receipts) = run(&cli).unwrap() else {
        panic!("expected receipts");
    };
    assert_eq!(receipts.len(), 2);
    assert!(dir
        .path()
        .join("batches/pool/HistosV1/JetHT2016H2.job")
        .is_file());
}

#[test]
fn missing_template_names_the_file() {
    let dir = workspace(RUN);
    fs::remove_file(dir.path().join("histos.py")).unwrap();
    let err = run(&cli(dir.path(), &[])).unwrap_err();
    assert!(err.to_string().contains("histos.py"));
}
