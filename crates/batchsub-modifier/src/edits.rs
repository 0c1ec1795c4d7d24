//! Template edit lists produced by modifiers

use serde::{Deserialize, Serialize};

use crate::marker::Marker;

/// Find/replace edit against a known marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Marker to replace
    pub marker: Marker,
    /// Text substituted for the marker
    pub replacement: String,
    /// Message reported when the marker is missing
    pub failure_message: String,
}

impl Replacement {
    /// Create new replacement
    #[must_use]
    pub fn new(
        marker: Marker,
        replacement: impl Into<String>,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            marker,
            replacement: replacement.into(),
            failure_message: failure_message.into(),
        }
    }
}

/// Ordered additions and replacements for one sample
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEdits {
    /// Text blocks appended to the template, in order
    pub additions: Vec<String>,
    /// Marker replacements, in order
    pub replacements: Vec<Replacement>,
}

impl TemplateEdits {
    /// Create empty edit list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an appended text block
    #[must_use]
    pub fn with_addition(mut self, text: impl Into<String>) -> Self {
        self.additions.push(text.into());
        self
    }

    /// With an appended replacement
    #[must_use]
    pub fn with_replacement(mut self, replacement: Replacement) -> Self {
        self.replacements.push(replacement);
        self
    }

    /// Append another edit list after this one
    pub fn extend(&mut self, other: TemplateEdits) {
        self.additions.extend(other.additions);
        self.replacements.extend(other.replacements);
    }

    /// Check if there is nothing to do
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.replacements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_keeps_order() {
        let mut a = TemplateEdits::new()
            .with_addition("a1")
            .with_replacement(Replacement::new(Marker::IsMc, "is_mc = False", "m"));
        let b = TemplateEdits::new().with_addition("b1").with_addition("b2");
        a.extend(b);

        assert_eq!(a.additions, vec!["a1", "b1", "b2"]);
        assert_eq!(a.replacements.len(), 1);
        assert!(!a.is_empty());
        assert!(TemplateEdits::new().is_empty());
    }
}
