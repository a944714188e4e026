//! Canvas that records draw operations

use crate::canvas::{monospace_width, CanvasSurface, Color, Font, Rect};

/// One recorded canvas mutation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    SetSize {
        width: u32,
        height: u32,
    },
    Clear,
    StrokeRect {
        rect: Rect,
        color: Color,
        line_width: f32,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        font: String,
        color: Color,
    },
}

/// Headless canvas keeping a log of every mutation.
///
/// Text is measured with a monospace estimate.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations since creation or the last `take_ops`
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drain the operation log
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of recorded mutations
    pub fn mutation_count(&self) -> usize {
        self.ops.len()
    }

    /// Drawing operations currently visible: everything after the last
    /// clear or resize
    pub fn visible_ops(&self) -> &[DrawOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::Clear | DrawOp::SetSize { .. }))
            .map_or(0, |i| i + 1);
        &self.ops[start..]
    }
}

impl CanvasSurface for RecordingCanvas {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.ops.push(DrawOp::SetSize { width, height });
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.ops.push(DrawOp::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &Font, color: Color) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            font: font.css(),
            color,
        });
    }

    fn measure_text_width(&self, text: &str, font: &Font) -> f32 {
        monospace_width(text, font)
    }
}
