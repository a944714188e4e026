//! Raster canvas backed by an RGBA image

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;
use tracing::{debug, trace};

use crate::canvas::{monospace_width, CanvasSurface, Color, Font, Rect};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Text drawn on a raster canvas.
///
/// Glyphs are not rasterized; runs are kept alongside the image so callers
/// can composite them with a font renderer of their choice.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font: Font,
    pub color: Color,
}

/// Canvas that rasterizes rectangles into an `RgbaImage`
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    image: RgbaImage,
    text_runs: Vec<TextRun>,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            text_runs: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn text_runs(&self) -> &[TextRun] {
        &self.text_runs
    }

    /// Write the current overlay as PNG (format chosen by extension)
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save(path)?;
        debug!("Overlay snapshot written to {}", path.display());
        Ok(())
    }

    /// Integer rectangle covering `rect`, or `None` if it has no area
    fn pixel_rect(rect: Rect) -> Option<PixelRect> {
        let width = rect.width.round();
        let height = rect.height.round();
        if width < 1.0 || height < 1.0 {
            return None;
        }
        Some(PixelRect::at(rect.x.round() as i32, rect.y.round() as i32).of_size(width as u32, height as u32))
    }
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

impl CanvasSurface for RasterCanvas {
    fn set_size(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
        self.text_runs.clear();
    }

    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self) {
        self.image.pixels_mut().for_each(|px| *px = TRANSPARENT);
        self.text_runs.clear();
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        // Strokes are centered on the rectangle's outline
        let lw = line_width.round().max(1.0) as i32;
        for offset in (-(lw - 1) / 2)..=(lw / 2) {
            let grown = Rect::new(
                rect.x - offset as f32,
                rect.y - offset as f32,
                rect.width + 2.0 * offset as f32,
                rect.height + 2.0 * offset as f32,
            );
            if let Some(px) = Self::pixel_rect(grown) {
                draw_hollow_rect_mut(&mut self.image, px, rgba(color));
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if let Some(px) = Self::pixel_rect(rect) {
            draw_filled_rect_mut(&mut self.image, px, rgba(color));
        }
    }

    /// Text is kept as a `TextRun` and not rasterized, so saved images show
    /// label tags without their text.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &Font, color: Color) {
        trace!("Text run {:?} at ({}, {})", text, x, y);
        self.text_runs.push(TextRun {
            text: text.to_string(),
            x,
            y,
            font: font.clone(),
            color,
        });
    }

    fn measure_text_width(&self, text: &str, font: &Font) -> f32 {
        monospace_width(text, font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_pixels() {
        let mut canvas = RasterCanvas::new(20, 20);
        canvas.fill_rect(Rect::new(2.0, 3.0, 4.0, 5.0), Color::LIME);

        assert_eq!(*canvas.image().get_pixel(2, 3), Rgba([0, 255, 0, 255]));
        assert_eq!(*canvas.image().get_pixel(5, 7), Rgba([0, 255, 0, 255]));
        assert_eq!(*canvas.image().get_pixel(6, 3), TRANSPARENT);
        assert_eq!(*canvas.image().get_pixel(2, 8), TRANSPARENT);
    }

    #[test]
    fn test_stroke_rect_is_hollow_and_wide() {
        let mut canvas = RasterCanvas::new(40, 40);
        canvas.stroke_rect(Rect::new(10.0, 10.0, 20.0, 20.0), Color::LIME, 3.0);

        let lime = Rgba([0, 255, 0, 255]);
        // Centered 3px stroke covers one pixel either side of the outline
        assert_eq!(*canvas.image().get_pixel(9, 20), lime);
        assert_eq!(*canvas.image().get_pixel(10, 20), lime);
        assert_eq!(*canvas.image().get_pixel(11, 20), lime);
        assert_eq!(*canvas.image().get_pixel(20, 20), TRANSPARENT);
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_rect(Rect::new(-5.0, -5.0, 8.0, 8.0), Color::WHITE);
        canvas.stroke_rect(Rect::new(5.0, 5.0, 50.0, 50.0), Color::LIME, 3.0);
        canvas.fill_rect(Rect::new(0.0, 0.0, 0.0, 4.0), Color::BLACK);
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_text_is_recorded_not_drawn() {
        let mut canvas = RasterCanvas::new(40, 20);
        canvas.fill_rect(Rect::new(0.0, 0.0, 40.0, 20.0), Color::LIME);
        canvas.fill_text("sad (75.0%)", 5.0, 15.0, &Font::default(), Color::BLACK);

        let lime = Rgba([0, 255, 0, 255]);
        assert!(canvas.image().pixels().all(|px| *px == lime));
        assert_eq!(canvas.text_runs().len(), 1);
        assert_eq!(canvas.text_runs()[0].text, "sad (75.0%)");
    }

    #[test]
    fn test_clear_and_resize() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        canvas.fill_text("happy (90.0%)", 1.0, 9.0, &Font::default(), Color::BLACK);
        assert_eq!(canvas.text_runs().len(), 1);

        canvas.clear();
        assert!(canvas.image().pixels().all(|px| *px == TRANSPARENT));
        assert!(canvas.text_runs().is_empty());

        canvas.set_size(64, 48);
        assert_eq!(canvas.size(), (64, 48));
    }
}
