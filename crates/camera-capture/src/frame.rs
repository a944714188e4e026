//! Video frame types

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
    /// Whether the stream has enough data for analysis
    ready: bool,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data, ready for analysis
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
            ready: true,
        }
    }

    /// Create a solid-color frame
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u32) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 3)
            .collect();
        Self::new(data, width, height, 0, sequence)
    }

    /// Mark the frame as still warming up (not available for analysis)
    pub fn warming_up(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Whether the frame can be handed to a detector.
    ///
    /// A zero-sized frame is never ready regardless of the stream flag.
    pub fn is_ready(&self) -> bool {
        self.ready && self.width > 0 && self.height > 0
    }

    /// Frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Mean luminance over the frame (0-255)
    pub fn mean_luma(&self) -> f32 {
        let pixels = self.data.len() / 3;
        if pixels == 0 {
            return 0.0;
        }
        let sum: f32 = self
            .data
            .chunks_exact(3)
            .map(|p| p[0] as f32 * 0.299 + p[1] as f32 * 0.587 + p[2] as f32 * 0.114)
            .sum();
        sum / pixels as f32
    }
}
