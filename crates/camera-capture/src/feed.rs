//! Frame buffers, camera streams and the video feed binding

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::frame::VideoFrame;

/// Latest-frame slot written by a camera stream.
///
/// Cloning shares the slot; readers always see the most recently
/// published frame. Once closed, the slot stays empty.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    slot: Arc<RwLock<Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Arc<VideoFrame>>,
    closed: bool,
}

impl FrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame. Returns `false` if the buffer is closed.
    pub fn publish(&self, frame: VideoFrame) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.closed {
            return false;
        }
        slot.latest = Some(Arc::new(frame));
        true
    }

    /// Most recently published frame
    pub fn latest(&self) -> Option<Arc<VideoFrame>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    /// Drop the current frame and refuse any later ones
    pub fn close(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.latest = None;
        slot.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}

/// Handle to a live camera stream
#[derive(Debug)]
pub struct CameraStream {
    id: u64,
    frames: FrameBuffer,
    shutdown: Arc<AtomicBool>,
}

impl CameraStream {
    /// Wrap a frame buffer as stream `id`
    pub fn new(id: u64, frames: FrameBuffer) -> Self {
        Self {
            id,
            frames,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stream identifier assigned by the source
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Frame buffer this stream writes into
    pub fn frames(&self) -> &FrameBuffer {
        &self.frames
    }

    /// Flag observed by the producer; set once the stream is stopped
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Stop all tracks: the producer exits and the buffer is closed
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.frames.close();
    }

    /// Whether `stop` has been called
    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// The point a camera stream is bound to and detection reads from.
#[derive(Debug, Clone, Default)]
pub struct VideoFeed {
    source: Arc<RwLock<Option<FrameBuffer>>>,
}

impl VideoFeed {
    /// Create an unbound feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the stream's frame buffer as the frame source
    pub fn bind(&self, stream: &CameraStream) {
        self.bind_buffer(stream.frames().clone());
    }

    /// Use an arbitrary buffer as the frame source
    pub fn bind_buffer(&self, frames: FrameBuffer) {
        let mut source = self.source.write().unwrap_or_else(PoisonError::into_inner);
        *source = Some(frames);
    }

    /// Detach the current source
    pub fn unbind(&self) {
        let mut source = self.source.write().unwrap_or_else(PoisonError::into_inner);
        *source = None;
    }

    /// Whether a source is bound
    pub fn is_bound(&self) -> bool {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current frame of the bound source, ready or not
    pub fn current_frame(&self) -> Option<Arc<VideoFrame>> {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(FrameBuffer::latest)
    }

    /// Current frame, only if it is available for analysis
    pub fn ready_frame(&self) -> Option<Arc<VideoFrame>> {
        self.current_frame().filter(|frame| frame.is_ready())
    }

    /// Pixel dimensions of the current frame
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.current_frame().map(|frame| frame.dimensions())
    }
}
