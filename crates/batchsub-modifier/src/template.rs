//! Compiled job template
//!
//! Provides [`JobTemplate`], the shared job text with its marker set checked
//! once at compile time.

use std::collections::BTreeSet;
use std::path::Path;

use crate::edits::TemplateEdits;
use crate::error::ModifierError;
use crate::marker::Marker;

/// Shared job template with its present markers and content fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTemplate {
    text: String,
    markers: BTreeSet<Marker>,
    fingerprint: String,
}

impl JobTemplate {
    /// Compile template text, recording which markers it contains
    #[must_use]
    pub fn compile(text: impl Into<String>) -> Self {
        let text = text.into();
        let markers: BTreeSet<Marker> = Marker::ALL
            .into_iter()
            .filter(|m| text.contains(m.text()))
            .collect();
        let fingerprint = hex::encode(blake3::hash(text.as_bytes()).as_bytes());
        tracing::debug!(fingerprint = %&fingerprint[..16], ?markers, "compiled job template");
        Self {
            text,
            markers,
            fingerprint,
        }
    }

    /// Read and compile a template file
    ///
    /// # Errors
    /// `ModifierError::Io` if the file cannot be read
    pub fn load(path: &Path) -> Result<Self, ModifierError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModifierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::compile(text))
    }

    /// Raw template text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Check if a marker is present
    #[inline]
    #[must_use]
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    /// Markers present in the template
    pub fn markers(&self) -> impl Iterator<Item = Marker> + '_ {
        self.markers.iter().copied()
    }

    /// Blake3 hex digest of the template text
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Check every replacement still finds its marker when the replacements
    /// run in order
    ///
    /// # Errors
    /// `ModifierError::TemplateDrift` for the first replacement whose marker is
    /// missing from the template or was consumed by an earlier replacement,
    /// carrying the modifier's failure message
    pub fn validate(&self, sample: &str, edits: &TemplateEdits) -> Result<(), ModifierError> {
        self.replace_all(sample, edits).map(drop)
    }

    fn replace_all(&self, sample: &str, edits: &TemplateEdits) -> Result<String, ModifierError> {
        let mut text = self.text.clone();
        for r in &edits.replacements {
            if !text.contains(r.marker.text()) {
                return Err(ModifierError::TemplateDrift {
                    sample: sample.to_string(),
                    marker: r.marker.text(),
                    message: r.failure_message.clone(),
                });
            }
            text = text.replace(r.marker.text(), &r.replacement);
        }
        Ok(text)
    }

    /// Produce the specialized job text: replacements in order, then additions appended
    ///
    /// # Errors
    /// `ModifierError::TemplateDrift` as for [`JobTemplate::validate`]
    pub fn render(&self, sample: &str, edits: &TemplateEdits) -> Result<String, ModifierError> {
        let mut text = self.replace_all(sample, edits)?;
        for addition in &edits.additions {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(addition);
        }
        Ok(text)
    }
}
