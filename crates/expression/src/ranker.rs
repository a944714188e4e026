//! Expression ranking

use serde::{Deserialize, Serialize};

use crate::label::Expression;
use crate::scores::ExpressionScores;

/// Top label of a score set and its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedExpression {
    pub label: Expression,
    pub confidence: f32,
}

impl RankedExpression {
    /// Overlay label text, e.g. `happy (93.5%)`
    pub fn label_text(&self) -> String {
        format!("{} ({:.1}%)", self.label, self.confidence * 100.0)
    }
}

/// Pick the label with the highest score.
///
/// Ties go to the label that comes first in canonical order. Returns `None`
/// only for an empty score set.
pub fn rank(scores: &ExpressionScores) -> Option<RankedExpression> {
    // Canonical iteration plus strict comparison keeps the earliest label on ties
    scores.iter().fold(None, |best, (label, confidence)| match best {
        Some(RankedExpression { confidence: top, .. }) if confidence <= top => best,
        _ => Some(RankedExpression { label, confidence }),
    })
}
