//! Named insertion points in the job template

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModifierError;

/// Closed set of literal fragments a modifier may replace
///
/// Presence of each marker is recorded once, when the template is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Simulation flag, flipped for recorded data
    IsMc,
    /// Special run-period flag
    SpecialPeriod,
}

impl Marker {
    /// All known markers
    pub const ALL: [Marker; 2] = [Marker::IsMc, Marker::SpecialPeriod];

    /// Literal text searched for in the template
    #[inline]
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::IsMc => "is_mc = True",
            Self::SpecialPeriod => "H = False",
        }
    }

    /// Configuration name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IsMc => "is_mc",
            Self::SpecialPeriod => "special_period",
        }
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marker {
    type Err = ModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ModifierError::UnknownMarker(s.to_string()))
    }
}
