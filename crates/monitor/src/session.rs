//! Monitoring session: the camera, detection and expression toggles

use std::sync::Arc;

use camera_capture::{CameraError, CameraSource, CameraStream, VideoFeed};
use detection_scheduler::{
    DetectionScheduler, SchedulerConfig, SchedulerError, SessionSnapshot, SessionState,
    SharedSession,
};
use expression::Detector;
use overlay::{CanvasSurface, OverlayRenderer};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::settings::SessionDefaults;

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Detection requires an active camera")]
    CameraInactive,
}

/// One user's monitoring session.
///
/// Owns the camera stream while the camera is on. Every transition takes
/// `&mut self`, so toggles never race each other.
pub struct Session<S, D, C>
where
    S: CameraSource,
    D: Detector + 'static,
    C: CanvasSurface + Send + 'static,
{
    camera: S,
    stream: Option<CameraStream>,
    feed: VideoFeed,
    shared: SharedSession<C>,
    scheduler: DetectionScheduler<D, C>,
}

impl<S, D, C> Session<S, D, C>
where
    S: CameraSource,
    D: Detector + 'static,
    C: CanvasSurface + Send + 'static,
{
    /// Create a session with camera, detection and expression mode all off
    pub fn new(
        camera: S,
        detector: Arc<D>,
        canvas: C,
        scheduler: SchedulerConfig,
        renderer: OverlayRenderer,
    ) -> Result<Self, SessionError> {
        let feed = VideoFeed::new();
        let shared = SharedSession::new(canvas);
        let scheduler =
            DetectionScheduler::new(scheduler, detector, feed.clone(), shared.clone(), renderer)?;

        Ok(Self {
            camera,
            stream: None,
            feed,
            shared,
            scheduler,
        })
    }

    /// Switch on whatever `defaults` asks for.
    ///
    /// A camera that cannot be opened is logged and leaves detection off.
    pub fn apply_defaults(&mut self, defaults: &SessionDefaults) -> Result<(), SessionError> {
        self.set_expression_mode(defaults.expression_mode_on_start);
        if defaults.camera_on_start {
            if let Err(e) = self.start_camera() {
                warn!("Camera not started: {}", e);
                return Ok(());
            }
            if defaults.detection_on_start {
                self.start_detection()?;
            }
        }
        Ok(())
    }

    pub fn toggle_camera(&mut self) -> Result<(), SessionError> {
        if self.stream.is_some() {
            self.stop_camera();
            Ok(())
        } else {
            self.start_camera()
        }
    }

    /// Acquire a stream and bind it to the video feed
    pub fn start_camera(&mut self) -> Result<(), SessionError> {
        if self.stream.is_some() {
            return Ok(());
        }

        match self.camera.acquire() {
            Ok(stream) => {
                self.feed.bind(&stream);
                info!("Camera stream {} active", stream.id());
                self.stream = Some(stream);
                self.shared.activate_camera();
                Ok(())
            }
            Err(e) => {
                error!("Error accessing camera: {}", e);
                self.shared.record_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Stop detection, then release the stream and every track on it
    pub fn stop_camera(&mut self) {
        self.scheduler.deactivate_camera();
        self.feed.unbind();
        if let Some(stream) = self.stream.take() {
            let id = stream.id();
            self.camera.release(stream);
            info!("Camera stream {} released", id);
        }
    }

    pub fn toggle_detection(&mut self) -> Result<(), SessionError> {
        if self.scheduler.is_running() {
            self.stop_detection();
            Ok(())
        } else {
            self.start_detection()
        }
    }

    pub fn start_detection(&mut self) -> Result<(), SessionError> {
        if !self.shared.state().camera_active() {
            return Err(SessionError::CameraInactive);
        }
        self.scheduler.start()?;
        Ok(())
    }

    /// Stop ticking and clear the overlay
    pub fn stop_detection(&mut self) {
        self.scheduler.stop();
    }

    pub fn toggle_expression_mode(&mut self) {
        let active = self.shared.state().expression_mode_active();
        self.set_expression_mode(!active);
    }

    pub fn set_expression_mode(&mut self, active: bool) {
        self.shared.set_expression_mode(active);
        info!(
            "Expression detection {}",
            if active { "enabled" } else { "disabled" }
        );
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot()
    }

    /// Shared state and overlay canvas
    pub fn shared(&self) -> &SharedSession<C> {
        &self.shared
    }

    pub fn feed(&self) -> &VideoFeed {
        &self.feed
    }

    pub fn scheduler(&self) -> &DetectionScheduler<D, C> {
        &self.scheduler
    }

    pub fn camera(&self) -> &S {
        &self.camera
    }

    /// Stop detection and release the camera
    pub fn teardown(&mut self) {
        if self.stream.is_some() || self.scheduler.is_running() {
            info!("Tearing down session");
        }
        self.stop_camera();
    }
}

impl<S, D, C> Drop for Session<S, D, C>
where
    S: CameraSource,
    D: Detector + 'static,
    C: CanvasSurface + Send + 'static,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
