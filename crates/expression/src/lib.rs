//! Facial Expression Analysis
//!
//! Types and capabilities shared by the detection pipeline:
//! - Closed set of expression labels with a canonical order
//! - Per-face expression scores and their ranking
//! - Face detections (bounding box + scores)
//! - The asynchronous `Detector` capability and a mock implementation
//! - Background color mapping for the dominant expression

pub mod background;
pub mod detection;
pub mod detector;
pub mod label;
pub mod ranker;
pub mod scores;

pub use background::BackgroundColor;
pub use detection::{BoundingBox, Detection};
pub use detector::{Detector, MockDetector};
pub use label::Expression;
pub use ranker::{rank, RankedExpression};
pub use scores::ExpressionScores;

use thiserror::Error;

/// Detector error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Errors building expression scores
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("Unknown expression label: {0}")]
    UnknownLabel(String),

    #[error("Score for {label} out of range [0, 1]: {value}")]
    OutOfRange { label: Expression, value: f32 },
}
