//! Camera Capture Library for Expression Monitoring
//!
//! Provides the camera side of a monitoring session:
//! - `VideoFrame`: one sampled RGB image with a readiness flag
//! - `FrameBuffer`: the continuously updated slot a stream writes into
//! - `VideoFeed`: the binding point detection reads frames from
//! - `CameraSource`: acquire/release of camera streams
//! - `SyntheticCamera`: a tokio-driven test pattern source

pub mod feed;
pub mod frame;
pub mod synthetic;

pub use feed::{CameraStream, FrameBuffer, VideoFeed};
pub use frame::VideoFrame;
pub use synthetic::SyntheticCamera;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Streaming error: {0}")]
    Stream(String),
}

/// A capability that hands out live camera streams.
///
/// `acquire` starts a stream whose frame buffer keeps updating until the
/// stream is passed back to `release`.
pub trait CameraSource: Send {
    /// Open the device and start streaming
    fn acquire(&mut self) -> Result<CameraStream, CameraError>;

    /// Stop all tracks of the stream and free the device
    fn release(&mut self, stream: CameraStream);
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device identifier (e.g., "/dev/video0")
    pub device: String,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
    /// Frames delivered before the stream reports itself ready
    pub warmup_frames: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 720,
            height: 560,
            fps: 30,
            warmup_frames: 0,
        }
    }
}

impl CameraConfig {
    /// Validate capture parameters
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Format(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(CameraError::Format("fps must be non-zero".to_string()));
        }
        Ok(())
    }
}
