use std::path::Path;

use photobooth_core::models::error::CameraError;
use photobooth_core::traits::still_capture::StillCapture;

use crate::command;

/// Raspberry Pi camera module, one `rpicam-still` run per photo.
pub struct RpicamStill {
    program: String,
}

impl RpicamStill {
    pub fn new() -> Self {
        Self::with_program("rpicam-still")
    }

    /// Use a different capture executable, e.g. the older `libcamera-still`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for RpicamStill {
    fn default() -> Self {
        Self::new()
    }
}

impl StillCapture for RpicamStill {
    fn capture_to(&mut self, path: &Path) -> Result<(), CameraError> {
        let target = path.to_string_lossy().into_owned();
        command::run(&self.program, &["--nopreview", "--immediate", "--output", &target])
            .map_err(CameraError::Device)?;
        if !path.exists() {
            return Err(CameraError::Storage(format!("{} was not written", path.display())));
        }
        log::debug!("{} wrote {}", self.program, path.display());
        Ok(())
    }
}
