//! Catalog loading from disk.

use batchsub_sample::{SampleCatalog, SampleError};
use std::io::Write;

fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn loads_yaml_and_json_by_extension() {
    let dir = tempfile::tempdir().unwrap();

    let yaml = write_file(
        &dir,
        "samples.yaml",
        "samples:\n  - name: qcdht2000_2017\n    kind: simulation\n    nevents: 5000000\n",
    );
    let json = write_file(
        &dir,
        "samples.json",
        r#"{"samples": [{"name": "JetHT2017C", "kind": "recorded", "condor": true}]}"#,
    );

    let from_yaml = SampleCatalog::load(&yaml).unwrap();
    assert_eq!(from_yaml.get("qcdht2000_2017").unwrap().nevents(), Some(5_000_000));

    let from_json = SampleCatalog::load(&json).unwrap();
    let data = from_json.get("JetHT2017C").unwrap();
    assert!(!data.is_mc());
    assert!(data.condor());
}

#[test]
fn rejects_unknown_extension_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let txt = write_file(&dir, "samples.txt", "samples: []");

    assert!(matches!(
        SampleCatalog::load(&txt).unwrap_err(),
        SampleError::UnsupportedFormat(_)
    ));
    assert!(matches!(
        SampleCatalog::load(&dir.path().join("missing.yaml")).unwrap_err(),
        SampleError::Io { .. }
    ));
}

#[test]
fn selected_dataset_must_be_declared() {
    let yaml = "samples:\n  - name: ttbar\n    kind: simulation\n    nevents: 1\n    dataset: miniaod\n    datasets:\n      main: {}\n";
    let err = SampleCatalog::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, SampleError::UnknownDataset { .. }));
    assert_eq!(err.sample(), Some("ttbar"));
}
