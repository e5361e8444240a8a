use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::models::capture_session::CaptureOutcome;
use crate::models::error::CameraError;
use crate::models::state::CameraConnectionState;
use crate::storage::photo_store;
use crate::traits::camera_device::{CameraDevice, SettingValue};

/// Camera configuration entry holding the battery percentage.
pub const BATTERY_SETTING: &str = "batterylevel";

/// The only startup setting the camera expects as a number.
pub const BURST_SETTING: &str = "burstnumber";

/// Owns the camera connection, the bounded retry protocol and battery telemetry.
///
/// The connection is opened on demand and closed again after every capture
/// and every configuration push: long-held connections to tethered cameras
/// go stale, so each session pays the reconnect cost instead.
pub struct CaptureController<C: CameraDevice> {
    device: C,
    state: CameraConnectionState,
    output_dir: PathBuf,
    battery_level: Option<u8>,
}

impl<C: CameraDevice> CaptureController<C> {
    pub fn new(device: C, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            device,
            state: CameraConnectionState::Closed,
            output_dir: output_dir.into(),
            battery_level: None,
        }
    }

    pub fn connection_state(&self) -> CameraConnectionState {
        self.state
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Open the camera connection unless it is already open.
    ///
    /// `CameraError::NotConnected` is passed through untouched so callers can
    /// tell an absent camera from a broken one; every other failure becomes
    /// `CameraError::Device`.
    pub fn ensure_open(&mut self) -> Result<(), CameraError> {
        if self.state == CameraConnectionState::Open {
            return Ok(());
        }
        log::debug!("Setting up camera connection");
        match self.device.open() {
            Ok(()) => {
                self.state = CameraConnectionState::Open;
                Ok(())
            }
            Err(CameraError::NotConnected) => Err(CameraError::NotConnected),
            Err(CameraError::Device(msg)) => Err(CameraError::Device(msg)),
            Err(other) => Err(CameraError::Device(other.to_string())),
        }
    }

    /// Close the camera connection. Closing twice only logs.
    pub fn close(&mut self) {
        if self.state == CameraConnectionState::Closed {
            log::debug!("Camera connection already closed");
            return;
        }
        log::debug!("Closing camera connection");
        if let Err(e) = self.device.close() {
            log::warn!("Error while closing camera connection: {}", e);
        }
        self.state = CameraConnectionState::Closed;
    }

    /// Push named settings to the camera, then close the connection again.
    ///
    /// `burstnumber` is sent as an integer; everything else as text. Battery
    /// telemetry is refreshed while the connection is open.
    pub fn apply_startup_config(&mut self, settings: &BTreeMap<String, String>) -> Result<(), CameraError> {
        self.ensure_open()?;

        let result = settings.iter().try_for_each(|(name, raw)| {
            let value = setting_value(name, raw)?;
            log::debug!("Setting camera {} = {}", name, value);
            self.device.set_setting(name, &value)
        });
        self.refresh_battery_level();
        self.close();

        result
    }

    /// Take one photo, retrying failed attempts up to `max_retries` times in total.
    ///
    /// The connection stays open across attempts and is closed before this
    /// returns, whatever the outcome. `on_processing` runs at most once, right
    /// after the shutter fires and before the file is downloaded.
    ///
    /// Running out of attempts is an expected outcome and is reported as
    /// `CaptureOutcome::Exhausted`, not as an error. Errors are reserved for
    /// a camera that cannot be opened and for failures saving the photo
    /// locally.
    pub fn capture(
        &mut self,
        max_retries: u32,
        retry_delay: Duration,
        mut on_processing: Option<&mut dyn FnMut()>,
    ) -> Result<CaptureOutcome, CameraError> {
        self.ensure_open()?;

        let mut notified = false;
        for attempt in 1..=max_retries {
            let file = match self.device.capture() {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("Capture attempt {}/{} failed: {}", attempt, max_retries, e);
                    pause_before_retry(attempt, max_retries, retry_delay);
                    continue;
                }
            };
            log::debug!("Took photo {}/{}", file.folder, file.name);

            if !notified {
                if let Some(callback) = on_processing.as_deref_mut() {
                    callback();
                }
                notified = true;
            }

            let bytes = match self.device.fetch_file(&file) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Download attempt {}/{} failed: {}", attempt, max_retries, e);
                    pause_before_retry(attempt, max_retries, retry_delay);
                    continue;
                }
            };
            log::debug!("Got file ({} bytes)", bytes.len());

            let saved = photo_store::save_capture(&self.output_dir, &bytes);
            self.refresh_battery_level();
            self.close();

            let path = saved?;
            log::info!("Saved photo to {} after {} attempt(s)", path.display(), attempt);
            return Ok(CaptureOutcome::Success { path, attempts: attempt });
        }

        self.close();
        log::warn!("Giving up on capture after {} attempt(s)", max_retries);
        Ok(CaptureOutcome::Exhausted { attempts: max_retries })
    }

    /// Last known battery percentage, refreshed after each successful capture.
    pub fn battery_level(&self) -> Option<u8> {
        self.battery_level
    }

    fn refresh_battery_level(&mut self) {
        if self.state != CameraConnectionState::Open {
            return;
        }
        self.battery_level = match self.device.get_setting(BATTERY_SETTING) {
            Ok(raw) => {
                let level = parse_battery_level(&raw);
                if level.is_none() {
                    log::debug!("Unrecognised battery level {:?}", raw);
                }
                level
            }
            Err(e) => {
                log::debug!("Battery level unavailable: {}", e);
                None
            }
        };
    }
}

fn pause_before_retry(attempt: u32, max_retries: u32, retry_delay: Duration) {
    if attempt < max_retries && !retry_delay.is_zero() {
        thread::sleep(retry_delay);
    }
}

fn setting_value(name: &str, raw: &str) -> Result<SettingValue, CameraError> {
    if name == BURST_SETTING {
        raw.trim()
            .parse::<i64>()
            .map(SettingValue::Int)
            .map_err(|_| CameraError::Device(format!("invalid {} value: {}", BURST_SETTING, raw)))
    } else {
        Ok(SettingValue::Text(raw.to_string()))
    }
}

/// Parse a battery reading such as `75%` into a percentage.
pub fn parse_battery_level(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number.parse::<u8>().ok().filter(|level| *level <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCamera;

    fn controller(camera: FakeCamera) -> (CaptureController<FakeCamera>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        (CaptureController::new(camera, tmp.path().join("captures")), tmp)
    }

    #[test]
    fn succeeds_on_last_allowed_attempt() {
        let camera = FakeCamera::new().failing_captures(2);
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        let outcome = controller.capture(3, Duration::ZERO, None).unwrap();

        assert_eq!(outcome.attempts(), 3);
        let path = outcome.path().unwrap();
        assert!(path.exists());
        assert_eq!(log.lock().capture_attempts, 3);
    }

    #[test]
    fn always_failing_camera_is_exhausted_without_extra_attempt() {
        let camera = FakeCamera::new().always_failing();
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        let outcome = controller.capture(4, Duration::ZERO, None).unwrap();

        assert_eq!(outcome, CaptureOutcome::Exhausted { attempts: 4 });
        assert_eq!(log.lock().capture_attempts, 4);
        assert_eq!(controller.connection_state(), CameraConnectionState::Closed);
    }

    #[test]
    fn connection_opened_once_per_capture_and_closed_after() {
        let camera = FakeCamera::new().failing_captures(1);
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        controller.capture(2, Duration::ZERO, None).unwrap();

        let log = log.lock();
        assert_eq!(log.open_calls, 1);
        assert_eq!(log.close_calls, 1);
        assert!(!log.is_open);
    }

    #[test]
    fn processing_callback_runs_once_on_success() {
        let camera = FakeCamera::new().failing_captures(1).failing_fetches(1);
        let (mut controller, _tmp) = controller(camera);

        let mut calls = 0;
        let mut on_processing = || calls += 1;
        let outcome = controller
            .capture(3, Duration::ZERO, Some(&mut on_processing))
            .unwrap();

        assert_eq!(outcome.attempts(), 3);
        assert_eq!(calls, 1);
    }

    #[test]
    fn processing_callback_not_called_when_exhausted() {
        let (mut controller, _tmp) = controller(FakeCamera::new().always_failing());

        let mut calls = 0;
        let mut on_processing = || calls += 1;
        controller
            .capture(2, Duration::ZERO, Some(&mut on_processing))
            .unwrap();

        assert_eq!(calls, 0);
    }

    #[test]
    fn failed_download_counts_as_attempt() {
        let camera = FakeCamera::new().failing_fetches(5);
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        let outcome = controller.capture(2, Duration::ZERO, None).unwrap();

        assert_eq!(outcome, CaptureOutcome::Exhausted { attempts: 2 });
        assert_eq!(log.lock().fetch_calls, 2);
    }

    #[test]
    fn not_connected_propagates_without_attempts() {
        let camera = FakeCamera::new().open_error(CameraError::NotConnected);
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        let err = controller.capture(3, Duration::ZERO, None).unwrap_err();

        assert_eq!(err, CameraError::NotConnected);
        assert_eq!(log.lock().capture_attempts, 0);
        assert_eq!(controller.connection_state(), CameraConnectionState::Closed);
    }

    #[test]
    fn other_open_failures_become_device_errors() {
        let camera = FakeCamera::new().open_error(CameraError::Transient("usb reset".into()));
        let (mut controller, _tmp) = controller(camera);

        let err = controller.ensure_open().unwrap_err();
        assert!(matches!(err, CameraError::Device(_)));
    }

    #[test]
    fn ensure_open_is_idempotent() {
        let camera = FakeCamera::new();
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        controller.ensure_open().unwrap();
        controller.ensure_open().unwrap();

        assert_eq!(log.lock().open_calls, 1);
        assert_eq!(controller.connection_state(), CameraConnectionState::Open);
    }

    #[test]
    fn close_twice_is_safe() {
        let camera = FakeCamera::new();
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        controller.ensure_open().unwrap();
        controller.close();
        controller.close();

        assert_eq!(log.lock().close_calls, 1);
    }

    #[test]
    fn battery_refreshed_after_success() {
        let (mut controller, _tmp) = controller(FakeCamera::new().battery(Some("15%")));
        assert_eq!(controller.battery_level(), None);

        controller.capture(1, Duration::ZERO, None).unwrap();

        assert_eq!(controller.battery_level(), Some(15));
    }

    #[test]
    fn missing_battery_reading_is_unknown() {
        let (mut controller, _tmp) = controller(FakeCamera::new().battery(None));

        let outcome = controller.capture(1, Duration::ZERO, None).unwrap();

        assert!(outcome.path().is_some());
        assert_eq!(controller.battery_level(), None);
    }

    #[test]
    fn startup_config_coerces_burst_number() {
        let camera = FakeCamera::new();
        let log = camera.log.clone();
        let (mut controller, _tmp) = controller(camera);

        let settings = BTreeMap::from([
            ("burstnumber".to_string(), "3".to_string()),
            ("iso".to_string(), "400".to_string()),
        ]);
        controller.apply_startup_config(&settings).unwrap();

        let log = log.lock();
        assert_eq!(
            log.settings,
            vec![
                ("burstnumber".to_string(), SettingValue::Int(3)),
                ("iso".to_string(), SettingValue::Text("400".into())),
            ]
        );
        assert!(!log.is_open);
        assert_eq!(controller.connection_state(), CameraConnectionState::Closed);
    }

    #[test]
    fn startup_config_rejects_bad_burst_number_and_still_closes() {
        let (mut controller, _tmp) = controller(FakeCamera::new());

        let settings = BTreeMap::from([("burstnumber".to_string(), "many".to_string())]);
        let err = controller.apply_startup_config(&settings).unwrap_err();

        assert!(matches!(err, CameraError::Device(_)));
        assert_eq!(controller.connection_state(), CameraConnectionState::Closed);
    }

    #[test]
    fn parses_battery_readings() {
        assert_eq!(parse_battery_level("75%"), Some(75));
        assert_eq!(parse_battery_level(" 40 % "), Some(40));
        assert_eq!(parse_battery_level("100"), Some(100));
        assert_eq!(parse_battery_level("101%"), None);
        assert_eq!(parse_battery_level("Full"), None);
        assert_eq!(parse_battery_level(""), None);
    }
}
