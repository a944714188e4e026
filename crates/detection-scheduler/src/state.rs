//! Session state tracking

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use expression::{BackgroundColor, Detection, Expression};
use overlay::CanvasSurface;
use serde::Serialize;
use tracing::error;

/// Session flags and values derived from the latest detection cycle.
///
/// Invariants: no dominant expression without faces, and none while
/// expression mode is off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    camera_active: bool,
    detection_active: bool,
    expression_mode_active: bool,
    face_count: usize,
    dominant_expression: Option<Expression>,
    last_error: Option<String>,
}

impl SessionState {
    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    pub fn detection_active(&self) -> bool {
        self.detection_active
    }

    pub fn expression_mode_active(&self) -> bool {
        self.expression_mode_active
    }

    pub fn face_count(&self) -> usize {
        self.face_count
    }

    pub fn dominant_expression(&self) -> Option<Expression> {
        self.dominant_expression
    }

    /// Most recent user-facing error (e.g. camera unavailable)
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Background tint for the current dominant expression
    pub fn background_color(&self) -> BackgroundColor {
        BackgroundColor::for_expression(self.dominant_expression)
    }

    /// Mark the camera as streaming or released.
    ///
    /// Releasing the camera also ends detection. Outside this crate a
    /// release goes through `DetectionScheduler::deactivate_camera`.
    pub(crate) fn set_camera_active(&mut self, active: bool) {
        self.camera_active = active;
        if !active {
            self.detection_active = false;
            self.reset_detections();
        }
    }

    /// Gate dominant expression computation
    pub(crate) fn set_expression_mode(&mut self, active: bool) {
        self.expression_mode_active = active;
        if !active {
            self.dominant_expression = None;
        }
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub(crate) fn set_detection_active(&mut self, active: bool) {
        self.detection_active = active;
    }

    /// Update derived values from one cycle's detections.
    ///
    /// The first detection is the primary face.
    pub(crate) fn apply_detections(&mut self, detections: &[Detection]) {
        self.face_count = detections.len();
        self.dominant_expression = match detections.first() {
            Some(primary) if self.expression_mode_active => {
                let top = primary.top_expression();
                if top.is_none() {
                    error!("Primary detection carries no expression scores");
                }
                top.map(|ranked| ranked.label)
            }
            _ => None,
        };
    }

    pub(crate) fn reset_detections(&mut self) {
        self.face_count = 0;
        self.dominant_expression = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let background = self.background_color();
        SessionSnapshot {
            camera_active: self.camera_active,
            detection_active: self.detection_active,
            expression_mode_active: self.expression_mode_active,
            face_count: self.face_count,
            dominant_expression: self.dominant_expression,
            background,
            background_hex: background.hex(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Read-only view of a session for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub camera_active: bool,
    pub detection_active: bool,
    pub expression_mode_active: bool,
    pub face_count: usize,
    pub dominant_expression: Option<Expression>,
    pub background: BackgroundColor,
    pub background_hex: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// Status text lines shown under the video
    pub fn status_lines(&self) -> [String; 2] {
        let expression = self
            .dominant_expression
            .map_or("None", |label| label.as_str());
        [
            format!("Face Count: {}", self.face_count),
            format!("Top Expression: {expression}"),
        ]
    }
}

/// State, canvas and epoch guarded together so a cycle's resize, render
/// and state update cannot interleave with a stop or another cycle
pub(crate) struct SessionCore<C> {
    pub(crate) state: SessionState,
    pub(crate) canvas: C,
    /// Advanced on every detection stop
    pub(crate) epoch: u64,
}

/// Shared handle to a session's state and overlay canvas
pub struct SharedSession<C> {
    inner: Arc<Mutex<SessionCore<C>>>,
}

impl<C> Clone for SharedSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: CanvasSurface> SharedSession<C> {
    /// New session with every flag off
    pub fn new(canvas: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionCore {
                state: SessionState::default(),
                canvas,
                epoch: 0,
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionCore<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().state.snapshot()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock().state)
    }

    /// Mark a freshly acquired camera stream as active
    pub fn activate_camera(&self) {
        self.update(|state| {
            state.clear_error();
            state.set_camera_active(true);
        });
    }

    /// Gate dominant expression computation for later cycles
    pub fn set_expression_mode(&self, active: bool) {
        self.update(|state| state.set_expression_mode(active));
    }

    /// Surface a user-facing error in the snapshot
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| state.record_error(message));
    }

    /// Access the overlay canvas
    pub fn with_canvas<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.lock().canvas)
    }

    /// Current detection epoch
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }
}
