//! Face and expression detector capability

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use camera_capture::VideoFrame;
use tracing::{debug, info};

use crate::detection::{BoundingBox, Detection};
use crate::label::Expression;
use crate::scores::ExpressionScores;
use crate::DetectorError;

/// Asynchronous face + expression analysis of a single frame.
///
/// Model loading happens before a detector is handed to the pipeline.
/// Detections come back in the model's output order.
pub trait Detector: Send + Sync {
    fn analyze(
        &self,
        frame: &VideoFrame,
    ) -> impl Future<Output = Result<Vec<Detection>, DetectorError>> + Send;
}

/// Frames between changes of the synthetic face's dominant expression
const SYNTHETIC_EXPRESSION_PERIOD: u32 = 30;

/// Frames darker than this contain no synthetic face
const SYNTHETIC_MIN_LUMA: f32 = 5.0;

/// Mock detector for development and tests.
///
/// Serves scripted responses first; once the script is exhausted it either
/// synthesizes one centered face per frame (rejecting frames still warming
/// up) or reports no faces. Every call can be delayed by a fixed latency to
/// simulate inference time.
pub struct MockDetector {
    latency: Duration,
    synthetic: bool,
    script: Mutex<VecDeque<Result<Vec<Detection>, DetectorError>>>,
    calls: AtomicUsize,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
}

impl MockDetector {
    /// Detector that synthesizes one face per frame
    pub fn new() -> Self {
        info!("Creating synthetic mock detector");
        Self {
            latency: Duration::ZERO,
            synthetic: true,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
            max_outstanding: AtomicUsize::new(0),
        }
    }

    /// Detector that replays `responses` in order, then finds no faces
    pub fn scripted<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<Detection>, DetectorError>>,
    {
        Self {
            synthetic: false,
            script: Mutex::new(responses.into_iter().collect()),
            ..Self::new()
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Total calls to `analyze`
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls currently awaiting their result
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously outstanding calls seen
    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }

    fn next_response(&self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectorError> {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match scripted {
            Some(response) => response,
            None if !self.synthetic => Ok(Vec::new()),
            None if !frame.is_ready() => Err(DetectorError::InvalidFrame(format!(
                "frame {} is still warming up",
                frame.sequence
            ))),
            None => Ok(synthetic_faces(frame)),
        }
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MockDetector {
    async fn analyze(&self, frame: &VideoFrame) -> Result<Vec<Detection>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _pending = Outstanding::enter(self);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = self.next_response(frame);
        debug!(
            "Mock detector answered frame {}: {:?}",
            frame.sequence,
            response.as_ref().map(Vec::len)
        );
        response
    }
}

/// Tracks one outstanding call; released on completion or cancellation
struct Outstanding<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> Outstanding<'a> {
    fn enter(detector: &'a MockDetector) -> Self {
        let now = detector.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        detector.max_outstanding.fetch_max(now, Ordering::SeqCst);
        Self {
            counter: &detector.outstanding,
        }
    }
}

impl Drop for Outstanding<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One centered face whose dominant expression rotates with the sequence
fn synthetic_faces(frame: &VideoFrame) -> Vec<Detection> {
    if frame.mean_luma() < SYNTHETIC_MIN_LUMA {
        return Vec::new();
    }

    let w = frame.width as f32;
    let h = frame.height as f32;
    let bbox = BoundingBox::new(w * 0.3, h * 0.2, w * 0.4, h * 0.5);

    let slot = (frame.sequence / SYNTHETIC_EXPRESSION_PERIOD) as usize % Expression::ALL.len();
    let dominant = Expression::ALL[slot];
    let mut scores = ExpressionScores::new();
    for label in Expression::ALL {
        let value = if label == dominant { 0.85 } else { 0.025 };
        // Constant scores are always within range
        let _ = scores.insert(label, value);
    }

    vec![Detection::new(bbox, scores)]
}
