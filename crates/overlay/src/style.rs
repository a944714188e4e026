//! Overlay styling

use serde::{Deserialize, Serialize};

use crate::canvas::{Color, Font};

/// Where a label tag goes when the box sits near the canvas edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPlacement {
    /// Shift the tag so it lies fully inside the canvas
    #[default]
    ClampInside,
    /// Keep the tag directly above the box, even if it leaves the canvas
    AllowClip,
}

/// Visual parameters of the detection overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Bounding box stroke color
    pub box_color: Color,
    /// Bounding box stroke width (px)
    pub line_width: f32,
    /// Label tag background
    pub label_fill: Color,
    /// Label text color
    pub label_text: Color,
    /// Label font
    pub font: Font,
    /// Label tag height (px)
    pub label_height: f32,
    /// Extra tag width beyond the measured text (px)
    pub label_padding: f32,
    /// Text offset from the tag's left edge (px)
    pub text_inset: f32,
    /// Distance from the tag bottom up to the text baseline (px)
    pub baseline_offset: f32,
    pub placement: LabelPlacement,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: Color::LIME,
            line_width: 3.0,
            label_fill: Color::LIME,
            label_text: Color::BLACK,
            font: Font::default(),
            label_height: 20.0,
            label_padding: 10.0,
            text_inset: 5.0,
            baseline_offset: 5.0,
            placement: LabelPlacement::ClampInside,
        }
    }
}
