//! Face detections

use serde::{Deserialize, Serialize};

use crate::ranker::{rank, RankedExpression};
use crate::scores::ExpressionScores;

/// Face bounding box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub expressions: ExpressionScores,
}

impl Detection {
    pub fn new(bbox: BoundingBox, expressions: ExpressionScores) -> Self {
        Self { bbox, expressions }
    }

    /// Top-ranked expression for this face
    pub fn top_expression(&self) -> Option<RankedExpression> {
        rank(&self.expressions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Expression;

    #[test]
    fn test_top_expression() {
        let detection = Detection::new(
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            ExpressionScores::from_pairs([(Expression::Angry, 0.8), (Expression::Sad, 0.1)])
                .unwrap(),
        );
        let top = detection.top_expression().unwrap();
        assert_eq!(top.label, Expression::Angry);
    }
}
