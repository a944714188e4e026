//! One detection cycle

use std::sync::Arc;
use std::time::Instant;

use camera_capture::VideoFeed;
use expression::{Detector, DetectorError};
use metrics::{counter, gauge, histogram};
use overlay::{CanvasSurface, OverlayRenderer};
use tracing::{debug, warn};

use crate::state::SharedSession;

/// How a cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No frame bound or the stream is still warming up
    FrameNotReady,
    /// Overlay and state updated with `faces` detections
    Completed { faces: usize },
    /// Detector rejected; state and overlay left as they were
    Failed(DetectorError),
    /// Result arrived after detection was stopped and was dropped
    Discarded,
}

impl CycleOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            CycleOutcome::FrameNotReady => "frame_not_ready",
            CycleOutcome::Completed { .. } => "completed",
            CycleOutcome::Failed(_) => "failed",
            CycleOutcome::Discarded => "discarded",
        }
    }
}

/// Capture -> detect -> render -> state update
pub struct DetectionCycle<D, C> {
    detector: Arc<D>,
    feed: VideoFeed,
    session: SharedSession<C>,
    renderer: Arc<OverlayRenderer>,
}

impl<D, C> Clone for DetectionCycle<D, C> {
    fn clone(&self) -> Self {
        Self {
            detector: self.detector.clone(),
            feed: self.feed.clone(),
            session: self.session.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl<D, C> DetectionCycle<D, C>
where
    D: Detector,
    C: CanvasSurface,
{
    pub fn new(
        detector: Arc<D>,
        feed: VideoFeed,
        session: SharedSession<C>,
        renderer: OverlayRenderer,
    ) -> Self {
        Self {
            detector,
            feed,
            session,
            renderer: Arc::new(renderer),
        }
    }

    pub fn session(&self) -> &SharedSession<C> {
        &self.session
    }

    /// Run one cycle on behalf of detection epoch `epoch`.
    ///
    /// The detector call is the only suspension point. Everything after it
    /// happens under a single session lock and only if `epoch` is still
    /// current.
    pub async fn run(&self, epoch: u64) -> CycleOutcome {
        let outcome = self.run_inner(epoch).await;
        counter!("detection_cycles_total", "outcome" => outcome.metric_label()).increment(1);
        outcome
    }

    async fn run_inner(&self, epoch: u64) -> CycleOutcome {
        let Some(frame) = self.feed.ready_frame() else {
            debug!("Frame not ready, skipping cycle");
            return CycleOutcome::FrameNotReady;
        };

        let started = Instant::now();
        let result = self.detector.analyze(&frame).await;
        histogram!("detector_latency_seconds").record(started.elapsed().as_secs_f64());

        let detections = match result {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Detection failed on frame {}: {}", frame.sequence, e);
                counter!("detector_failures_total").increment(1);
                return CycleOutcome::Failed(e);
            }
        };

        let mut core = self.session.lock();
        if core.epoch != epoch {
            debug!(
                "Discarding result for frame {} from stopped epoch {}",
                frame.sequence, epoch
            );
            return CycleOutcome::Discarded;
        }

        // Source resolution may have changed while the detector ran
        let (width, height) = self.feed.dimensions().unwrap_or(frame.dimensions());
        core.canvas.set_size(width, height);
        self.renderer.render(&mut core.canvas, &detections);
        core.state.apply_detections(&detections);

        gauge!("faces_detected").set(detections.len() as f64);
        debug!(
            "Frame {}: {} faces, dominant {:?}",
            frame.sequence,
            detections.len(),
            core.state.dominant_expression()
        );
        CycleOutcome::Completed {
            faces: detections.len(),
        }
    }
}
