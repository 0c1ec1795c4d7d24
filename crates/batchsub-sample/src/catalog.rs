//! Immutable sample catalog
//!
//! Holds every known [`Sample`] plus named groups. Orchestration entry points
//! receive a catalog by reference and work on owned copies returned by
//! [`SampleCatalog::select`], so one run never mutates another run's records.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SampleError;
use crate::sample::Sample;

/// Prefix marking a selector as a regular expression over sample names
const PATTERN_PREFIX: &str = "re:";

/// On-disk shape of a catalog (YAML or JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Sample records
    pub samples: Vec<Sample>,
    /// Named lists of sample names
    #[serde(default)]
    pub groups: IndexMap<String, Vec<String>>,
}

/// The set of known samples, keyed by name in declaration order
#[derive(Debug, Clone, Default)]
pub struct SampleCatalog {
    samples: IndexMap<String, Sample>,
    groups: IndexMap<String, Vec<String>>,
}

impl SampleCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed catalog file
    ///
    /// # Errors
    /// Duplicate names, invalid records, or groups naming unknown samples
    pub fn from_file(file: CatalogFile) -> Result<Self, SampleError> {
        let mut catalog = Self::new();
        for sample in file.samples {
            catalog.insert(sample)?;
        }
        for (name, members) in file.groups {
            catalog.add_group(name, members)?;
        }
        Ok(catalog)
    }

    /// Parse a YAML catalog
    ///
    /// # Errors
    /// Returns error if YAML is invalid or the records break an invariant
    pub fn from_yaml(yaml: &str) -> Result<Self, SampleError> {
        Self::from_file(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON catalog
    ///
    /// # Errors
    /// Returns error if JSON is invalid or the records break an invariant
    pub fn from_json(json: &str) -> Result<Self, SampleError> {
        Self::from_file(serde_json::from_str(json)?)
    }

    /// Load a catalog file, choosing the parser by extension
    ///
    /// # Errors
    /// IO failures, unsupported extensions, parse or invariant failures
    pub fn load(path: &Path) -> Result<Self, SampleError> {
        let text = std::fs::read_to_string(path).map_err(|source| SampleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text)?,
            Some("json") => Self::from_json(&text)?,
            _ => return Err(SampleError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(
            path = %path.display(),
            samples = catalog.len(),
            groups = catalog.groups.len(),
            "loaded sample catalog"
        );
        Ok(catalog)
    }

    /// Add a sample record
    ///
    /// # Errors
    /// `DuplicateSample` if the name is taken, or any record invariant failure
    pub fn insert(&mut self, mut sample: Sample) -> Result<(), SampleError> {
        sample.normalize()?;
        if self.samples.contains_key(sample.name()) {
            return Err(SampleError::DuplicateSample(sample.name().to_string()));
        }
        self.samples.insert(sample.name().to_string(), sample);
        Ok(())
    }

    /// Register a named group
    ///
    /// # Errors
    /// `UnknownSample` if a member is not in the catalog
    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        members: Vec<String>,
    ) -> Result<(), SampleError> {
        if let Some(missing) = members.iter().find(|m| !self.samples.contains_key(*m)) {
            return Err(SampleError::UnknownSample(missing.clone()));
        }
        self.groups.insert(name.into(), members);
        Ok(())
    }

    /// Look up a sample
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Sample> {
        self.samples.get(name)
    }

    /// Members of a group
    #[must_use]
    pub fn group(&self, name: &str) -> Option<Vec<&Sample>> {
        self.groups
            .get(name)
            .map(|members| members.iter().filter_map(|m| self.samples.get(m)).collect())
    }

    /// Number of samples
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate samples in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values()
    }

    /// Owned copies of the samples named by `selectors`
    ///
    /// A selector is a group name, a sample name, or `re:<pattern>` matched
    /// against sample names. Order follows first appearance; duplicates are
    /// dropped.
    ///
    /// # Errors
    /// `UnknownSelector` for selectors matching nothing, `InvalidPattern` for
    /// bad regular expressions
    pub fn select<S: AsRef<str>>(&self, selectors: &[S]) -> Result<Vec<Sample>, SampleError> {
        let mut chosen: IndexSet<&str> = IndexSet::new();

        for selector in selectors {
            let selector = selector.as_ref();
            if let Some(pattern) = selector.strip_prefix(PATTERN_PREFIX) {
                let re = Regex::new(pattern).map_err(|source| SampleError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
                let matched: Vec<&str> = self
                    .samples
                    .keys()
                    .map(String::as_str)
                    .filter(|n| re.is_match(n))
                    .collect();
                if matched.is_empty() {
                    return Err(SampleError::UnknownSelector(selector.to_string()));
                }
                chosen.extend(matched);
            } else if let Some(members) = self.groups.get(selector) {
                chosen.extend(members.iter().map(String::as_str));
            } else if let Some((name, _)) = self.samples.get_key_value(selector) {
                chosen.insert(name.as_str());
            } else {
                return Err(SampleError::UnknownSelector(selector.to_string()));
            }
        }

        Ok(chosen
            .into_iter()
            .filter_map(|name| self.samples.get(name).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetVariant;
    use pretty_assertions::assert_eq;

    fn catalog() -> SampleCatalog {
        let mut c = SampleCatalog::new();
        c.insert(Sample::simulation("qcdht0700_2017", 100)).unwrap();
        c.insert(Sample::simulation("qcdht1000_2017", 100)).unwrap();
        c.insert(Sample::simulation("ttbar_2017", 100).with_condor(true))
            .unwrap();
        c.insert(Sample::recorded("JetHT2017B")).unwrap();
        c.add_group(
            "qcd_samples_2017",
            vec!["qcdht0700_2017".into(), "qcdht1000_2017".into()],
        )
        .unwrap();
        c
    }

    fn names(samples: &[Sample]) -> Vec<&str> {
        samples.iter().map(Sample::name).collect()
    }

    #[test]
    fn duplicate_rejected() {
        let mut c = catalog();
        let err = c.insert(Sample::recorded("JetHT2017B")).unwrap_err();
        assert!(matches!(err, SampleError::DuplicateSample(_)));
    }

    #[test]
    fn group_with_unknown_member_rejected() {
        let mut c = catalog();
        let err = c.add_group("g", vec!["nope".into()]).unwrap_err();
        assert!(matches!(err, SampleError::UnknownSample(_)));
    }

    #[test]
    fn select_groups_names_and_patterns() {
        let c = catalog();
        let got = c
            .select(&["qcd_samples_2017", "JetHT2017B", "re:^ttbar", "qcdht0700_2017"])
            .unwrap();
        assert_eq!(
            names(&got),
            vec!["qcdht0700_2017", "qcdht1000_2017", "JetHT2017B", "ttbar_2017"]
        );
    }

    #[test]
    fn select_unknown_fails() {
        let c = catalog();
        assert!(matches!(
            c.select(&["nope"]).unwrap_err(),
            SampleError::UnknownSelector(_)
        ));
        assert!(matches!(
            c.select(&["re:^zz"]).unwrap_err(),
            SampleError::UnknownSelector(_)
        ));
        assert!(matches!(
            c.select(&["re:("]).unwrap_err(),
            SampleError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn select_returns_copies() {
        let c = catalog();
        let mut got = c.select(&["ttbar_2017"]).unwrap();
        got[0]
            .set_splitting(crate::Splitting::new("ttbar_2017", crate::SplitBy::Files, 1, 3).unwrap());
        assert!(c.get("ttbar_2017").unwrap().splitting().is_none());
    }

    #[test]
    fn yaml_catalog_parses() {
        let yaml = r"
samples:
  - name: ttbar_2017
    kind: simulation
    nevents: 20000000
    condor: true
    datasets:
      main: { nfiles: 400 }
      miniaod: { nfiles: 120, nevents: 20000000 }
  - name: JetHT2017F
    kind: recorded
    runs: { first: 305040, last: 306460 }
groups:
  data_samples_2017: [JetHT2017F]
";
        let c = SampleCatalog::from_yaml(yaml).unwrap();
        assert_eq!(c.len(), 2);

        let ttbar = c.get("ttbar_2017").unwrap();
        assert!(ttbar.is_mc());
        assert!(ttbar.condor());
        assert!(ttbar.has_dataset("miniaod"));
        assert_eq!(
            ttbar.current_variant(),
            Some(&DatasetVariant::new().with_files(400))
        );

        let data = c.get("JetHT2017F").unwrap();
        assert!(!data.is_mc());
        assert!(data.runs().unwrap().contains(305_100));
        assert!(data.has_dataset(crate::DEFAULT_DATASET));
        assert_eq!(c.group("data_samples_2017").unwrap().len(), 1);
    }

    #[test]
    fn yaml_lumi_filter_on_simulation_rejected() {
        let yaml = r"
samples:
  - name: ttbar
    kind: simulation
    nevents: 10
    json: a.json
";
        assert!(matches!(
            SampleCatalog::from_yaml(yaml).unwrap_err(),
            SampleError::LumiFilterOnSimulation(_)
        ));
    }

    #[test]
    fn misspelled_key_rejected() {
        let yaml = "samples:\n  - name: JetHT2017C\n    kind: recorded\n    condr: true\n";
        let err = SampleCatalog::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SampleError::InvalidYaml(_)));
        assert!(err.to_string().contains("condr"));
    }

    #[test]
    fn record_fields_must_match_kind() {
        let yaml = "samples:\n  - name: ttbar\n    kind: simulation\n";
        let err = SampleCatalog::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("simulation needs nevents"));

        let yaml = "samples:\n  - name: JetHT2017C\n    kind: recorded\n    nevents: 4\n";
        assert!(SampleCatalog::from_yaml(yaml).is_err());
    }

    #[test]
    fn names_must_be_one_path_component() {
        let mut c = SampleCatalog::new();
        for bad in ["../../escaped", "sub/x", "a\\b", "", "x..y"] {
            let err = c.insert(Sample::simulation(bad, 1)).unwrap_err();
            assert!(
                matches!(err, SampleError::InvalidName { .. }),
                "{bad:?} accepted"
            );
        }
        assert!(c.is_empty());

        let yaml = "samples:\n  - name: ../../escaped\n    kind: recorded\n";
        let err = SampleCatalog::from_yaml(yaml).unwrap_err();
        assert_eq!(err.sample(), Some("../../escaped"));
    }
}
