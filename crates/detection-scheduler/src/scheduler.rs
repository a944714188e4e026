//! Detection Scheduler Implementation

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use camera_capture::VideoFeed;
use expression::Detector;
use metrics::counter;
use overlay::{CanvasSurface, OverlayRenderer};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cycle::DetectionCycle;
use crate::state::SharedSession;
use crate::SchedulerError;

/// Configuration for the detection scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Time between detection ticks in milliseconds (default: 200)
    pub period_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { period_ms: 200 }
    }
}

impl SchedulerConfig {
    /// Interval between ticks
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.period_ms == 0 {
            return Err(SchedulerError::InvalidPeriod(self.period_ms));
        }
        Ok(())
    }
}

/// Tick counters since the scheduler was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Ticks fired across all runs
    pub ticks: u64,
    /// Ticks dropped because a cycle was still in flight
    pub skipped_ticks: u64,
    /// Cycles launched
    pub cycles_started: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    skipped_ticks: AtomicU64,
    cycles_started: AtomicU64,
}

/// Clears the in-flight flag when a cycle task ends, however it ends
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    /// Claim the single cycle slot, or `None` if a cycle is running
    fn try_claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Fixed-cadence driver of detection cycles.
///
/// While running, every tick launches a cycle unless the previous one is
/// still awaiting its detector, in which case the tick is skipped.
pub struct DetectionScheduler<D, C> {
    config: SchedulerConfig,
    cycle: DetectionCycle<D, C>,
    in_flight: Arc<AtomicBool>,
    counters: Arc<Counters>,
    ticker: Option<JoinHandle<()>>,
}

impl<D, C> DetectionScheduler<D, C>
where
    D: Detector + 'static,
    C: CanvasSurface + Send + 'static,
{
    /// Create a stopped scheduler
    pub fn new(
        config: SchedulerConfig,
        detector: Arc<D>,
        feed: VideoFeed,
        session: SharedSession<C>,
        renderer: OverlayRenderer,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        info!("Detection scheduler created with {}ms period", config.period_ms);

        Ok(Self {
            config,
            cycle: DetectionCycle::new(detector, feed, session, renderer),
            in_flight: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
            ticker: None,
        })
    }

    /// Begin ticking. Does nothing if already running.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.is_running() {
            debug!("Detection scheduler already running");
            return Ok(());
        }
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let epoch = {
            let mut core = self.cycle.session().lock();
            core.state.set_detection_active(true);
            core.epoch
        };

        let handle = runtime.spawn(run_ticks(
            self.cycle.clone(),
            self.in_flight.clone(),
            self.counters.clone(),
            self.config.period(),
            epoch,
        ));
        self.ticker = Some(handle);

        info!("Starting detection scheduler (epoch {})", epoch);
        Ok(())
    }

    /// Stop ticking and reset the overlay.
    ///
    /// A cycle already awaiting its detector is left to finish; its result is
    /// discarded because the epoch moves on here. Does nothing if detection
    /// is not running.
    pub fn stop(&mut self) {
        self.halt(false);
    }

    /// Stop detection and mark the camera as released, under one lock, so
    /// no cycle can write into a session whose camera is off
    pub fn deactivate_camera(&mut self) {
        self.halt(true);
    }

    fn halt(&mut self, release_camera: bool) {
        let ticker = self.ticker.take();
        let mut core = self.cycle.session().lock();
        let was_active = ticker.is_some() || core.state.detection_active();

        if let Some(ticker) = ticker {
            ticker.abort();
        }
        if release_camera {
            core.state.set_camera_active(false);
        }
        if !was_active {
            return;
        }

        core.epoch = core.epoch.wrapping_add(1);
        core.state.set_detection_active(false);
        core.state.reset_detections();
        core.canvas.clear();

        info!("Stopped detection scheduler (epoch now {})", core.epoch);
    }

    /// Check if the tick loop is alive
    pub fn is_running(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    /// Whether a cycle is awaiting its detector
    pub fn is_cycle_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ticks: self.counters.ticks.load(Ordering::SeqCst),
            skipped_ticks: self.counters.skipped_ticks.load(Ordering::SeqCst),
            cycles_started: self.counters.cycles_started.load(Ordering::SeqCst),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl<D, C> Drop for DetectionScheduler<D, C> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

async fn run_ticks<D, C>(
    cycle: DetectionCycle<D, C>,
    in_flight: Arc<AtomicBool>,
    counters: Arc<Counters>,
    period: Duration,
    epoch: u64,
) where
    D: Detector + 'static,
    C: CanvasSurface + Send + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        counters.ticks.fetch_add(1, Ordering::SeqCst);

        let Some(slot) = InFlight::try_claim(&in_flight) else {
            counters.skipped_ticks.fetch_add(1, Ordering::SeqCst);
            counter!("detection_ticks_skipped_total").increment(1);
            debug!("Previous cycle still in flight, skipping tick");
            continue;
        };

        counters.cycles_started.fetch_add(1, Ordering::SeqCst);
        let cycle = cycle.clone();
        tokio::spawn(async move {
            let _slot = slot;
            let outcome = cycle.run(epoch).await;
            debug!("Cycle finished: {:?}", outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_capture::{FrameBuffer, VideoFrame};
    use expression::{BoundingBox, Detection, DetectorError, Expression, ExpressionScores, MockDetector};
    use overlay::RecordingCanvas;

    fn face(scores: &[(Expression, f32)]) -> Detection {
        Detection::new(
            BoundingBox::new(40.0, 60.0, 100.0, 100.0),
            ExpressionScores::from_pairs(scores.iter().copied()).unwrap(),
        )
    }

    fn scheduler(
        detector: Arc<MockDetector>,
        period_ms: u64,
    ) -> (
        DetectionScheduler<MockDetector, RecordingCanvas>,
        SharedSession<RecordingCanvas>,
    ) {
        let frames = FrameBuffer::new();
        frames.publish(VideoFrame::filled(640, 480, [90, 90, 90], 1));
        let feed = VideoFeed::new();
        feed.bind_buffer(frames);

        let session = SharedSession::new(RecordingCanvas::new());
        session.update(|state| {
            state.set_camera_active(true);
            state.set_expression_mode(true);
        });
        let scheduler = DetectionScheduler::new(
            SchedulerConfig { period_ms },
            detector,
            feed,
            session.clone(),
            OverlayRenderer::default(),
        )
        .unwrap();
        (scheduler, session)
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = SchedulerConfig { period_ms: 0 };
        assert!(matches!(config.validate(), Err(SchedulerError::InvalidPeriod(0))));
        assert_eq!(SchedulerConfig::default().period(), Duration::from_millis(200));
    }

    #[test]
    fn test_start_without_runtime() {
        let (mut scheduler, session) = scheduler(Arc::new(MockDetector::new()), 200);
        assert!(matches!(scheduler.start(), Err(SchedulerError::NoRuntime)));
        assert!(!scheduler.is_running());
        assert!(!session.state().detection_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_detector_never_overlaps() {
        let detector = Arc::new(MockDetector::new().with_latency(Duration::from_millis(500)));
        let (mut scheduler, session) = scheduler(detector.clone(), 200);

        scheduler.start().unwrap();
        assert!(session.state().detection_active());

        // Ticks at 0, 200, ..., 1200; cycles launch at 0, 600 and 1200
        tokio::time::sleep(Duration::from_millis(1250)).await;

        assert_eq!(detector.max_outstanding(), 1);
        assert_eq!(detector.calls(), 3);
        let stats = scheduler.stats();
        assert_eq!(stats.ticks, 7);
        assert_eq!(stats.skipped_ticks, 4);
        assert_eq!(stats.cycles_started, 3);
        assert_eq!(session.state().face_count(), 1);

        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let detector = Arc::new(MockDetector::new());
        let (mut scheduler, _session) = scheduler(detector.clone(), 200);

        scheduler.start().unwrap();
        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Ticks at 0, 200, 400 from a single loop
        assert_eq!(scheduler.stats().ticks, 3);
        assert_eq!(detector.calls(), 3);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let detector = Arc::new(
            MockDetector::scripted([Ok(vec![
                face(&[(Expression::Happy, 0.9)]),
                face(&[(Expression::Angry, 0.8)]),
            ])])
            .with_latency(Duration::from_millis(500)),
        );
        let (mut scheduler, session) = scheduler(detector.clone(), 200);

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(scheduler.is_cycle_in_flight());

        scheduler.stop();
        let after_stop = session.state();
        let ops_after_stop = session.with_canvas(|c| c.mutation_count());
        assert!(!after_stop.detection_active());
        assert_eq!(after_stop.face_count(), 0);
        assert_eq!(after_stop.dominant_expression(), None);
        assert!(session.with_canvas(|c| c.visible_ops().is_empty()));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(detector.outstanding(), 0);
        assert!(!scheduler.is_cycle_in_flight());
        assert_eq!(session.state(), after_stop);
        assert_eq!(session.with_canvas(|c| c.mutation_count()), ops_after_stop);
        assert_eq!(detector.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_has_single_loop() {
        let detector = Arc::new(MockDetector::new().with_latency(Duration::from_millis(500)));
        let (mut scheduler, session) = scheduler(detector.clone(), 200);

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();
        assert!(!scheduler.is_running());

        scheduler.start().unwrap();
        scheduler.start().unwrap();
        assert!(scheduler.is_running());

        // New loop ticks at 50, 250, ..., 1050; the first-run cycle holds
        // the slot until 500, so the next launch is at 650
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(detector.max_outstanding(), 1);
        assert_eq!(detector.calls(), 2);
        assert_eq!(scheduler.stats().ticks, 7);
        assert!(session.state().detection_active());
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_release_ends_cycles() {
        let detector = Arc::new(MockDetector::new());
        let (mut scheduler, session) = scheduler(detector.clone(), 200);

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.state().face_count(), 1);

        scheduler.deactivate_camera();
        tokio::time::sleep(Duration::from_millis(450)).await;

        let state = session.state();
        assert!(!state.camera_active());
        assert!(!state.detection_active());
        assert_eq!(state.face_count(), 0);
        assert_eq!(state.dominant_expression(), None);
        assert!(!scheduler.is_running());
        assert_eq!(detector.calls(), 1);
        assert!(session.with_canvas(|c| c.visible_ops().is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_noop() {
        let (mut scheduler, session) = scheduler(Arc::new(MockDetector::new()), 200);
        scheduler.stop();
        assert_eq!(session.epoch(), 0);
        assert_eq!(session.with_canvas(|c| c.mutation_count()), 0);

        scheduler.start().unwrap();
        scheduler.stop();
        let ops = session.with_canvas(|c| c.mutation_count());
        scheduler.stop();
        scheduler.deactivate_camera();
        assert_eq!(session.epoch(), 1);
        assert_eq!(session.with_canvas(|c| c.mutation_count()), ops);
        assert!(!session.state().camera_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detector_failure_keeps_ticking() {
        let detector = Arc::new(MockDetector::scripted([
            Ok(vec![face(&[(Expression::Sad, 0.8)])]),
            Err(DetectorError::ModelNotLoaded("expression net".into())),
        ]));
        let (mut scheduler, session) = scheduler(detector.clone(), 200);

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.state().face_count(), 1);
        assert_eq!(session.state().dominant_expression(), Some(Expression::Sad));

        // Tick at 200 fails: previous values persist
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(session.state().face_count(), 1);
        assert!(scheduler.is_running());

        // Tick at 400 succeeds with no faces
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(session.state().face_count(), 0);
        assert_eq!(session.state().dominant_expression(), None);
        assert_eq!(detector.calls(), 3);
        scheduler.stop();
    }
}
