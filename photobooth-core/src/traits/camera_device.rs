use std::fmt;

use crate::models::error::CameraError;

/// Location of a captured image on the camera's own storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFile {
    pub folder: String,
    pub name: String,
}

/// Value written to a named camera setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Interface for a tethered camera.
///
/// The capture controller owns the only instance and serializes every call;
/// implementations need no internal locking.
///
/// Implemented by:
/// - `GphotoCamera` (gphoto2 command line)
pub trait CameraDevice: Send {
    /// Connect to the camera. Fails with `CameraError::NotConnected` when no
    /// camera is attached and `CameraError::Device` for any other fault.
    fn open(&mut self) -> Result<(), CameraError>;

    /// Release the shutter. Failures here are expected and retried.
    fn capture(&mut self) -> Result<CameraFile, CameraError>;

    /// Download a captured file.
    fn fetch_file(&mut self, file: &CameraFile) -> Result<Vec<u8>, CameraError>;

    /// Read the current value of a configuration entry.
    fn get_setting(&mut self, name: &str) -> Result<String, CameraError>;

    /// Write a configuration entry.
    fn set_setting(&mut self, name: &str, value: &SettingValue) -> Result<(), CameraError>;

    /// Disconnect from the camera.
    fn close(&mut self) -> Result<(), CameraError>;
}
