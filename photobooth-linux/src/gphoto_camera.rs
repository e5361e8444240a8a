//! Tethered camera driven through the `gphoto2` command line tool.
//!
//! gphoto2 opens and releases the USB connection on every invocation, so
//! `open` only detects the camera and pins its port for the calls that
//! follow.

use photobooth_core::models::error::CameraError;
use photobooth_core::traits::camera_device::{CameraDevice, CameraFile, SettingValue};

use crate::command;

const NEW_FILE_PREFIX: &str = "New file is in location ";
const NEW_FILE_SUFFIX: &str = " on the camera";

pub struct GphotoCamera {
    program: String,
    port: Option<String>,
}

impl GphotoCamera {
    pub fn new() -> Self {
        Self::with_program("gphoto2")
    }

    /// Use a different gphoto2 executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            port: None,
        }
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, String> {
        let port = self.port.as_deref().unwrap_or_default();
        let mut full = Vec::with_capacity(args.len() + 2);
        if !port.is_empty() {
            full.extend(["--port", port]);
        }
        full.extend_from_slice(args);
        command::run(&self.program, &full)
    }

    fn run_text(&self, args: &[&str]) -> Result<String, String> {
        self.run(args).map(|stdout| String::from_utf8_lossy(&stdout).into_owned())
    }

    fn require_open(&self) -> Result<(), CameraError> {
        if self.port.is_none() {
            return Err(CameraError::Device("camera connection is not open".into()));
        }
        Ok(())
    }
}

impl Default for GphotoCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDevice for GphotoCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        let listing = command::run_text(&self.program, &["--auto-detect"]).map_err(CameraError::Device)?;
        let Some((model, port)) = parse_auto_detect(&listing).into_iter().next() else {
            return Err(CameraError::NotConnected);
        };
        log::info!("Found camera {} on {}", model, port);
        self.port = Some(port);
        Ok(())
    }

    fn capture(&mut self) -> Result<CameraFile, CameraError> {
        self.require_open()?;
        let output = self.run_text(&["--capture-image"]).map_err(CameraError::Transient)?;
        parse_new_file(&output)
            .ok_or_else(|| CameraError::Transient(format!("unexpected gphoto2 output: {}", output.trim())))
    }

    fn fetch_file(&mut self, file: &CameraFile) -> Result<Vec<u8>, CameraError> {
        self.require_open()?;
        let location = format!("{}/{}", file.folder.trim_end_matches('/'), file.name);
        let bytes = self
            .run(&["--get-file", &location, "--stdout"])
            .map_err(CameraError::Transient)?;
        if bytes.is_empty() {
            return Err(CameraError::Transient(format!("{} downloaded empty", location)));
        }
        Ok(bytes)
    }

    fn get_setting(&mut self, name: &str) -> Result<String, CameraError> {
        self.require_open()?;
        let output = self.run_text(&["--get-config", name]).map_err(CameraError::Device)?;
        parse_current_value(&output)
            .ok_or_else(|| CameraError::Device(format!("no current value for {}", name)))
    }

    fn set_setting(&mut self, name: &str, value: &SettingValue) -> Result<(), CameraError> {
        self.require_open()?;
        let assignment = format!("{}={}", name, value);
        self.run(&["--set-config", &assignment]).map_err(CameraError::Device)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CameraError> {
        if let Some(port) = self.port.take() {
            log::debug!("Released camera on {}", port);
        }
        Ok(())
    }
}

/// Cameras listed by `gphoto2 --auto-detect`, as `(model, port)` pairs.
///
/// ```text
/// Model                          Port
/// ----------------------------------------------------------
/// Canon EOS 600D                 usb:001,004
/// ```
pub fn parse_auto_detect(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .skip_while(|line| !line.starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let line = line.trim_end();
            let (model, port) = line.rsplit_once(char::is_whitespace)?;
            let model = model.trim();
            if model.is_empty() || port.is_empty() {
                return None;
            }
            Some((model.to_string(), port.to_string()))
        })
        .collect()
}

/// Location of the image reported by `--capture-image`.
pub fn parse_new_file(output: &str) -> Option<CameraFile> {
    let location = output.lines().find_map(|line| {
        line.trim()
            .strip_prefix(NEW_FILE_PREFIX)
            .map(|rest| rest.strip_suffix(NEW_FILE_SUFFIX).unwrap_or(rest))
    })?;
    let (folder, name) = location.rsplit_once('/')?;
    if name.is_empty() {
        return None;
    }
    Some(CameraFile {
        folder: if folder.is_empty() { "/".into() } else { folder.into() },
        name: name.into(),
    })
}

/// The `Current:` line of `--get-config`.
pub fn parse_current_value(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Current:"))
        .map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_detect_lists_cameras() {
        let output = "Model                          Port\n\
                      ----------------------------------------------------------\n\
                      Canon EOS 600D                 usb:001,004\n";
        assert_eq!(
            parse_auto_detect(output),
            [("Canon EOS 600D".to_string(), "usb:001,004".to_string())]
        );
    }

    #[test]
    fn auto_detect_without_cameras_is_empty() {
        let output = "Model                          Port\n\
                      ----------------------------------------------------------\n";
        assert!(parse_auto_detect(output).is_empty());
    }

    #[test]
    fn new_file_location_is_split() {
        let output = "New file is in location /store_00020001/DCIM/100CANON/IMG_0042.JPG on the camera\n";
        assert_eq!(
            parse_new_file(output),
            Some(CameraFile {
                folder: "/store_00020001/DCIM/100CANON".into(),
                name: "IMG_0042.JPG".into(),
            })
        );
    }

    #[test]
    fn capture_without_location_is_none() {
        assert_eq!(parse_new_file("*** Error: Could not capture image.\n"), None);
    }

    #[test]
    fn current_value_is_trimmed() {
        let output = "Label: Battery Level\nReadonly: 0\nType: TEXT\nCurrent: 85%\nEND\n";
        assert_eq!(parse_current_value(output).as_deref(), Some("85%"));
    }

    #[test]
    fn closed_camera_refuses_capture() {
        let mut camera = GphotoCamera::new();
        assert!(matches!(camera.capture(), Err(CameraError::Device(_))));
    }

    #[test]
    fn missing_tool_is_a_device_error() {
        let mut camera = GphotoCamera::with_program("definitely-not-gphoto2");
        assert!(matches!(camera.open(), Err(CameraError::Device(_))));
    }
}
