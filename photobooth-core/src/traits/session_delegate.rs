use crate::models::capture_session::CaptureSession;
use crate::models::error::CameraError;
use crate::models::state::SessionPhase;

/// Event delegate for session notifications.
///
/// All methods are called from the orchestrator thread, in order.
pub trait SessionDelegate: Send + Sync {
    /// Called when the session moves to a new phase.
    fn on_phase_changed(&self, phase: &SessionPhase);

    /// Called when a capture phase ends, successfully or not.
    fn on_capture_finished(&self, session: &CaptureSession);

    /// Called when a camera fault aborts the current session.
    fn on_camera_error(&self, error: &CameraError);

    /// Called after a print attempt with its outcome.
    fn on_print_finished(&self, printed: bool);
}
