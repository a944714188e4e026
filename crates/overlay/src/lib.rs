//! Detection Overlay Rendering
//!
//! Draws face bounding boxes and expression label tags onto a drawable
//! surface. The surface is abstracted by `CanvasSurface`; two
//! implementations ship with the crate:
//! - `RecordingCanvas` keeps a log of draw operations
//! - `RasterCanvas` rasterizes into an RGBA image

pub mod canvas;
pub mod raster;
pub mod recording;
pub mod renderer;
pub mod style;

pub use canvas::{CanvasSurface, Color, Font, Rect};
pub use raster::RasterCanvas;
pub use recording::{DrawOp, RecordingCanvas};
pub use renderer::{OverlayRenderer, RenderSummary};
pub use style::{LabelPlacement, OverlayStyle};

use thiserror::Error;

/// Errors parsing colors from configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("Color must look like #rrggbb, got {0:?}")]
    Malformed(String),
}
