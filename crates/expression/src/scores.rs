//! Per-face expression scores

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::label::Expression;
use crate::ranker::{rank, RankedExpression};
use crate::ScoreError;

/// Confidence score per expression label for one face.
///
/// Scores are in [0, 1] and need not sum to 1. Iteration follows the
/// canonical label order regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Expression, f32>",
    into = "BTreeMap<Expression, f32>"
)]
pub struct ExpressionScores {
    scores: BTreeMap<Expression, f32>,
}

impl ExpressionScores {
    /// Create an empty score set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (label, score) pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ScoreError>
    where
        I: IntoIterator<Item = (Expression, f32)>,
    {
        let mut scores = Self::new();
        for (label, value) in pairs {
            scores.insert(label, value)?;
        }
        Ok(scores)
    }

    /// Set the score for a label, returning the previous score
    pub fn insert(&mut self, label: Expression, value: f32) -> Result<Option<f32>, ScoreError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ScoreError::OutOfRange { label, value });
        }
        Ok(self.scores.insert(label, value))
    }

    /// Score for a label
    pub fn get(&self, label: Expression) -> Option<f32> {
        self.scores.get(&label).copied()
    }

    /// Number of scored labels
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether no label is scored
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Scores in canonical label order
    pub fn iter(&self) -> impl Iterator<Item = (Expression, f32)> + '_ {
        self.scores.iter().map(|(label, value)| (*label, *value))
    }

    /// Top-ranked expression
    pub fn top(&self) -> Option<RankedExpression> {
        rank(self)
    }
}

impl TryFrom<BTreeMap<Expression, f32>> for ExpressionScores {
    type Error = ScoreError;

    fn try_from(map: BTreeMap<Expression, f32>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

impl From<ExpressionScores> for BTreeMap<Expression, f32> {
    fn from(scores: ExpressionScores) -> Self {
        scores.scores
    }
}
