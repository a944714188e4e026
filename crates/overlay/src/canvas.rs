//! Drawable surface primitives

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ColorParseError;

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<expression::BoundingBox> for Rect {
    fn from(bbox: expression::BoundingBox) -> Self {
        Self::new(bbox.x, bbox.y, bbox.width, bbox.height)
    }
}

/// Opaque RGB color, configured as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const LIME: Color = Color::rgb(0x00, 0xff, 0x00);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ColorParseError::Malformed(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(malformed)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(malformed());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| malformed());
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Text font
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Font {
    pub family: String,
    pub size_px: f32,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size_px: 16.0,
        }
    }
}

impl Font {
    /// CSS shorthand, e.g. `16px Arial`
    pub fn css(&self) -> String {
        format!("{}px {}", self.size_px, self.family)
    }
}

/// A 2D surface detections are drawn onto.
///
/// Setting the size discards existing content.
pub trait CanvasSurface {
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    fn clear(&mut self);

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw `text` with its baseline starting at (x, y)
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &Font, color: Color);

    fn measure_text_width(&self, text: &str, font: &Font) -> f32;
}

/// Average glyph advance as a fraction of the font size
pub(crate) const MONOSPACE_ADVANCE_EM: f32 = 0.6;

/// Width estimate for canvases without real font metrics
pub(crate) fn monospace_width(text: &str, font: &Font) -> f32 {
    text.chars().count() as f32 * font.size_px * MONOSPACE_ADVANCE_EM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let color: Color = "#d1F7c4".parse().unwrap();
        assert_eq!(color, Color::rgb(0xd1, 0xf7, 0xc4));
        assert_eq!(color.to_string(), "#d1f7c4");
    }

    #[test]
    fn test_color_rejects_garbage() {
        for bad in ["d1f7c4", "#d1f7c", "#zzzzzz", "#d1f7c4ff", "#ééé"] {
            assert!(bad.parse::<Color>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_color_serde() {
        let color: Color = serde_json::from_str("\"#00ff00\"").unwrap();
        assert_eq!(color, Color::LIME);
        assert_eq!(serde_json::to_string(&Color::BLACK).unwrap(), "\"#000000\"");
    }

    #[test]
    fn test_font_css() {
        assert_eq!(Font::default().css(), "16px Arial");
    }

    #[test]
    fn test_monospace_width() {
        let font = Font::default();
        assert!((monospace_width("abcd", &font) - 38.4).abs() < 1e-4);
        assert_eq!(monospace_width("", &font), 0.0);
    }
}
