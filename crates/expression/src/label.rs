//! Expression labels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScoreError;

/// Facial expression label.
///
/// Declaration order is the canonical order used to break ranking ties, and
/// the derived `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Happy,
    Sad,
    Angry,
    Surprised,
    Neutral,
    Fearful,
    Disgusted,
}

impl Expression {
    /// All labels in canonical order
    pub const ALL: [Expression; 7] = [
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Surprised,
        Expression::Neutral,
        Expression::Fearful,
        Expression::Disgusted,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Surprised => "surprised",
            Expression::Neutral => "neutral",
            Expression::Fearful => "fearful",
            Expression::Disgusted => "disgusted",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expression {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScoreError::UnknownLabel(s.to_string()))
    }
}
