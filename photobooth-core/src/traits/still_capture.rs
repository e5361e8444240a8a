use std::path::Path;

use crate::models::error::CameraError;

/// Fallback camera used when no DSLR is configured.
///
/// One call, one photo written straight to `path`; there is no connection
/// lifecycle and no retry.
///
/// Implemented by:
/// - `RpicamStill` (Raspberry Pi camera module)
pub trait StillCapture: Send {
    fn capture_to(&mut self, path: &Path) -> Result<(), CameraError>;
}
