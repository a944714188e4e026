//! Overlay renderer

use expression::{BoundingBox, Detection};
use tracing::{trace, warn};

use crate::canvas::{CanvasSurface, Rect};
use crate::style::{LabelPlacement, OverlayStyle};

/// What one render pass drew
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub boxes: usize,
    pub labels: usize,
}

/// Draws bounding boxes and expression tags for a frame's detections
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Replace the canvas content with the overlay for `detections`.
    ///
    /// The canvas must already match the frame's pixel dimensions.
    pub fn render<C>(&self, canvas: &mut C, detections: &[Detection]) -> RenderSummary
    where
        C: CanvasSurface + ?Sized,
    {
        canvas.clear();

        let mut summary = RenderSummary::default();
        for detection in detections {
            canvas.stroke_rect(
                detection.bbox.into(),
                self.style.box_color,
                self.style.line_width,
            );
            summary.boxes += 1;

            let Some(top) = detection.top_expression() else {
                warn!("Detection without expression scores, skipping its label");
                continue;
            };
            let text = top.label_text();
            let text_width = canvas.measure_text_width(&text, &self.style.font);
            let tag = self.label_rect(&detection.bbox, text_width, canvas.size());

            canvas.fill_rect(tag, self.style.label_fill);
            canvas.fill_text(
                &text,
                tag.x + self.style.text_inset,
                tag.y + tag.height - self.style.baseline_offset,
                &self.style.font,
                self.style.label_text,
            );
            summary.labels += 1;
        }

        trace!(
            "Rendered {} boxes and {} labels",
            summary.boxes,
            summary.labels
        );
        summary
    }

    /// Label tag rectangle for a box whose text measures `text_width`.
    ///
    /// The tag sits directly above the box's top edge. With
    /// `ClampInside` its top never goes above 0 and its right edge stays
    /// within the canvas width unless the tag is wider than the canvas,
    /// in which case it starts at 0.
    pub fn label_rect(&self, bbox: &BoundingBox, text_width: f32, canvas: (u32, u32)) -> Rect {
        let width = text_width + self.style.label_padding;
        let height = self.style.label_height;
        let x = bbox.x;
        let y = bbox.y - height;

        match self.style.placement {
            LabelPlacement::AllowClip => Rect::new(x, y, width, height),
            LabelPlacement::ClampInside => {
                let max_x = canvas.0 as f32 - width;
                Rect::new(x.min(max_x).max(0.0), y.max(0.0), width, height)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, Font};
    use crate::recording::{DrawOp, RecordingCanvas};
    use expression::{Expression, ExpressionScores};

    fn face(x: f32, y: f32, scores: &[(Expression, f32)]) -> Detection {
        Detection::new(
            BoundingBox::new(x, y, 100.0, 120.0),
            ExpressionScores::from_pairs(scores.iter().copied()).unwrap(),
        )
    }

    fn sized_canvas() -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        canvas.set_size(640, 480);
        canvas.take_ops();
        canvas
    }

    #[test]
    fn test_render_box_and_label() {
        let renderer = OverlayRenderer::default();
        let mut canvas = sized_canvas();

        let summary = renderer.render(&mut canvas, &[face(50.0, 100.0, &[(Expression::Happy, 0.935)])]);
        assert_eq!(summary, RenderSummary { boxes: 1, labels: 1 });

        let ops = canvas.ops();
        assert_eq!(ops[0], DrawOp::Clear);
        assert_eq!(
            ops[1],
            DrawOp::StrokeRect {
                rect: Rect::new(50.0, 100.0, 100.0, 120.0),
                color: Color::LIME,
                line_width: 3.0,
            }
        );

        let text = "happy (93.5%)";
        let width = canvas.measure_text_width(text, &Font::default()) + 10.0;
        assert_eq!(
            ops[2],
            DrawOp::FillRect {
                rect: Rect::new(50.0, 80.0, width, 20.0),
                color: Color::LIME,
            }
        );
        match &ops[3] {
            DrawOp::FillText { text: drawn, x, y, font, color } => {
                assert_eq!(drawn, text);
                assert_eq!((*x, *y), (55.0, 95.0));
                assert_eq!(font, "16px Arial");
                assert_eq!(*color, Color::BLACK);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_render_clears_previous_overlay() {
        let renderer = OverlayRenderer::default();
        let mut canvas = sized_canvas();

        renderer.render(
            &mut canvas,
            &[
                face(10.0, 50.0, &[(Expression::Sad, 0.6)]),
                face(300.0, 50.0, &[(Expression::Angry, 0.6)]),
            ],
        );
        renderer.render(&mut canvas, &[]);

        assert!(canvas.visible_ops().is_empty());
    }

    #[test]
    fn test_label_clamped_at_top_edge() {
        let renderer = OverlayRenderer::default();
        let tag = renderer.label_rect(&BoundingBox::new(40.0, 5.0, 80.0, 80.0), 60.0, (640, 480));
        assert_eq!(tag, Rect::new(40.0, 0.0, 70.0, 20.0));
    }

    #[test]
    fn test_label_clamped_at_right_edge() {
        let renderer = OverlayRenderer::default();
        let tag = renderer.label_rect(&BoundingBox::new(600.0, 100.0, 40.0, 40.0), 90.0, (640, 480));
        assert_eq!(tag, Rect::new(540.0, 80.0, 100.0, 20.0));

        // Wider than the canvas: pinned to the left edge
        let tag = renderer.label_rect(&BoundingBox::new(10.0, 100.0, 40.0, 40.0), 700.0, (640, 480));
        assert_eq!(tag.x, 0.0);
    }

    #[test]
    fn test_label_allow_clip() {
        let renderer = OverlayRenderer::new(OverlayStyle {
            placement: LabelPlacement::AllowClip,
            ..Default::default()
        });
        let tag = renderer.label_rect(&BoundingBox::new(600.0, 5.0, 40.0, 40.0), 90.0, (640, 480));
        assert_eq!(tag, Rect::new(600.0, -15.0, 100.0, 20.0));
    }

    #[test]
    fn test_detection_without_scores_gets_box_only() {
        let renderer = OverlayRenderer::default();
        let mut canvas = sized_canvas();
        let summary = renderer.render(&mut canvas, &[face(10.0, 50.0, &[])]);
        assert_eq!(summary, RenderSummary { boxes: 1, labels: 0 });
        assert_eq!(canvas.ops().len(), 2);
    }
}
