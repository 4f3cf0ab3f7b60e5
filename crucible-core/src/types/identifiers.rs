//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a pre-registered quantitative prediction.
///
/// Ordering is lexicographic; the FDR controller relies on it to break ties
/// between equal significances deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(String);

impl PredictionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PredictionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PredictionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for PredictionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
