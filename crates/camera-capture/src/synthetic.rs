//! Synthetic camera source
//!
//! Produces a moving test pattern at the configured frame rate on the tokio
//! runtime. Useful for headless runs and tests where no device is present.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::feed::{CameraStream, FrameBuffer};
use crate::frame::VideoFrame;
use crate::{CameraConfig, CameraError, CameraSource};

/// Camera source backed by a generated test pattern
pub struct SyntheticCamera {
    config: CameraConfig,
    available: bool,
    next_id: u64,
    producers: HashMap<u64, JoinHandle<()>>,
}

impl SyntheticCamera {
    /// Create a synthetic camera with the given capture parameters
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            available: true,
            next_id: 1,
            producers: HashMap::new(),
        }
    }

    /// Create a camera whose acquisition always fails
    pub fn unavailable(config: CameraConfig) -> Self {
        let mut camera = Self::new(config);
        camera.available = false;
        camera
    }

    /// Simulate the device being plugged in or unplugged
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Number of streams currently producing frames
    pub fn active_streams(&self) -> usize {
        self.producers.len()
    }

    /// Capture parameters
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

impl CameraSource for SyntheticCamera {
    fn acquire(&mut self) -> Result<CameraStream, CameraError> {
        if !self.available {
            return Err(CameraError::Open(format!(
                "{}: device unavailable",
                self.config.device
            )));
        }
        self.config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| CameraError::Stream(format!("no async runtime: {e}")))?;

        let id = self.next_id;
        self.next_id += 1;

        let frames = FrameBuffer::new();
        let stream = CameraStream::new(id, frames.clone());
        let pattern = TestPattern::new(&self.config);

        // First frame is available as soon as the stream opens
        frames.publish(pattern.frame(0, 0));

        let shutdown = stream.shutdown_flag();
        let period = Duration::from_secs_f64(1.0 / self.config.fps as f64);
        let handle = runtime.spawn(produce_frames(frames, pattern, period, shutdown));
        self.producers.insert(id, handle);

        info!(
            "Synthetic camera stream {} opened: {}x{} @ {} fps",
            id, self.config.width, self.config.height, self.config.fps
        );
        Ok(stream)
    }

    fn release(&mut self, stream: CameraStream) {
        match self.producers.remove(&stream.id()) {
            Some(handle) => {
                handle.abort();
                info!("Synthetic camera stream {} released", stream.id());
            }
            None => warn!("Release of unknown camera stream {}", stream.id()),
        }
        stream.stop();
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        for (_, handle) in self.producers.drain() {
            handle.abort();
        }
    }
}

async fn produce_frames(
    frames: FrameBuffer,
    pattern: TestPattern,
    period: Duration,
    shutdown: Arc<AtomicBool>,
) {
    let started = Instant::now();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The immediate first tick corresponds to the frame published on open
    interval.tick().await;

    let mut sequence: u32 = 1;
    loop {
        interval.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            debug!("Synthetic producer observed shutdown");
            break;
        }
        let timestamp_ns = started.elapsed().as_nanos() as u64;
        if !frames.publish(pattern.frame(sequence, timestamp_ns)) {
            debug!("Frame buffer closed, stopping producer");
            break;
        }
        sequence = sequence.wrapping_add(1);
    }
}

/// Generator for the synthetic frames
#[derive(Debug, Clone)]
struct TestPattern {
    width: u32,
    height: u32,
    warmup_frames: u32,
}

impl TestPattern {
    fn new(config: &CameraConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            warmup_frames: config.warmup_frames,
        }
    }

    fn frame(&self, sequence: u32, timestamp_ns: u64) -> VideoFrame {
        // Slowly cycling tint so consecutive frames differ
        let shade = (sequence.wrapping_mul(7) % 256) as u8;
        let mut frame = VideoFrame::filled(self.width, self.height, [shade, 128, 200], sequence);
        frame.timestamp_ns = timestamp_ns;
        if sequence < self.warmup_frames {
            frame.warming_up()
        } else {
            frame
        }
    }
}
