//! Background color derived from the dominant expression

use serde::{Deserialize, Serialize};

use crate::label::Expression;

/// Interface background tint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundColor {
    LightGreen,
    LightRed,
    LightBlue,
    LightYellow,
    #[default]
    Neutral,
}

impl BackgroundColor {
    /// Color for the dominant expression; total over all inputs including absent
    pub fn for_expression(dominant: Option<Expression>) -> Self {
        match dominant {
            Some(Expression::Happy) => BackgroundColor::LightGreen,
            Some(Expression::Angry) => BackgroundColor::LightRed,
            Some(Expression::Sad) => BackgroundColor::LightBlue,
            Some(Expression::Surprised) => BackgroundColor::LightYellow,
            _ => BackgroundColor::Neutral,
        }
    }

    /// CSS hex value
    pub fn hex(&self) -> &'static str {
        match self {
            BackgroundColor::LightGreen => "#d1f7c4",
            BackgroundColor::LightRed => "#f9c0c0",
            BackgroundColor::LightBlue => "#c0d6f9",
            BackgroundColor::LightYellow => "#fff3b0",
            BackgroundColor::Neutral => "#ffffff",
        }
    }
}
