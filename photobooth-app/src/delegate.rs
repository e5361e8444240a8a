use parking_lot::Mutex;
use serde::Serialize;

use photobooth_core::{CameraError, CaptureSession, SessionDelegate, SessionPhase};

/// SessionDelegate that turns session events into log lines and keeps
/// running totals for the shutdown summary.
#[derive(Default)]
pub struct LoggingDelegate {
    stats: Mutex<SessionStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub sessions: u32,
    pub photos: u32,
    pub failed_captures: u32,
    pub prints: u32,
    pub failed_prints: u32,
}

impl LoggingDelegate {
    pub fn stats(&self) -> SessionStats {
        *self.stats.lock()
    }
}

impl SessionDelegate for LoggingDelegate {
    fn on_phase_changed(&self, phase: &SessionPhase) {
        if let SessionPhase::Countdown = phase {
            self.stats.lock().sessions += 1;
        }
        log::debug!("phase-changed {}", phase.name());
    }

    fn on_capture_finished(&self, session: &CaptureSession) {
        {
            let mut stats = self.stats.lock();
            if session.is_success() {
                stats.photos += 1;
            } else {
                stats.failed_captures += 1;
            }
        }

        match serde_json::to_string(session) {
            Ok(json) => log::debug!("capture-finished {}", json),
            Err(e) => log::warn!("Couldn't serialize capture event: {}", e),
        }
        match session.path() {
            Some(path) => log::info!("Photo {} taken in {} attempt(s)", path.display(), session.attempts_made),
            None => log::info!("No photo after {} attempt(s)", session.attempts_made),
        }
    }

    fn on_camera_error(&self, error: &CameraError) {
        log::error!("Camera error: {}", error);
    }

    fn on_print_finished(&self, printed: bool) {
        let mut stats = self.stats.lock();
        if printed {
            stats.prints += 1;
        } else {
            stats.failed_prints += 1;
        }
    }
}
