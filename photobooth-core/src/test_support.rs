//! Scripted fakes for the hardware traits, shared by the crate's unit tests.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use parking_lot::Mutex;

use crate::bus::touch_event_bus::TouchEventBus;
use crate::models::capture_session::CaptureSession;
use crate::models::error::{CameraError, DisplayError, PrinterError};
use crate::models::overlay::Overlay;
use crate::models::state::SessionPhase;
use crate::models::touch::TouchEvent;
use crate::traits::camera_device::{CameraDevice, CameraFile, SettingValue};
use crate::traits::display_renderer::DisplayRenderer;
use crate::traits::printer_transport::PrinterTransport;
use crate::traits::session_delegate::SessionDelegate;
use crate::traits::still_capture::StillCapture;

/// A small valid JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40])));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

#[derive(Debug, Default)]
pub struct CameraLog {
    pub open_calls: u32,
    pub close_calls: u32,
    pub capture_attempts: u32,
    pub fetch_calls: u32,
    pub is_open: bool,
    pub settings: Vec<(String, SettingValue)>,
}

/// Camera whose failures are scripted up front.
#[derive(Debug, Clone)]
pub struct FakeCamera {
    pub log: Arc<Mutex<CameraLog>>,
    open_error: Option<CameraError>,
    failing_captures: u32,
    failing_fetches: u32,
    battery: Option<String>,
    image: Vec<u8>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(CameraLog::default())),
            open_error: None,
            failing_captures: 0,
            failing_fetches: 0,
            battery: Some("100%".into()),
            image: jpeg_bytes(64, 48),
        }
    }

    /// Fail the first `count` shutter releases.
    pub fn failing_captures(mut self, count: u32) -> Self {
        self.failing_captures = count;
        self
    }

    /// Fail the first `count` downloads.
    pub fn failing_fetches(mut self, count: u32) -> Self {
        self.failing_fetches = count;
        self
    }

    pub fn always_failing(self) -> Self {
        self.failing_captures(u32::MAX)
    }

    pub fn open_error(mut self, error: CameraError) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn battery(mut self, raw: Option<&str>) -> Self {
        self.battery = raw.map(str::to_string);
        self
    }
}

impl CameraDevice for FakeCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        let mut log = self.log.lock();
        log.open_calls += 1;
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        log.is_open = true;
        Ok(())
    }

    fn capture(&mut self) -> Result<CameraFile, CameraError> {
        let mut log = self.log.lock();
        if !log.is_open {
            return Err(CameraError::Device("capture on closed camera".into()));
        }
        log.capture_attempts += 1;
        if log.capture_attempts <= self.failing_captures {
            return Err(CameraError::Transient("focus failed".into()));
        }
        Ok(CameraFile {
            folder: "/store_00010001/DCIM/100CANON".into(),
            name: format!("IMG_{:04}.JPG", log.capture_attempts),
        })
    }

    fn fetch_file(&mut self, _file: &CameraFile) -> Result<Vec<u8>, CameraError> {
        let mut log = self.log.lock();
        log.fetch_calls += 1;
        if log.fetch_calls <= self.failing_fetches {
            return Err(CameraError::Transient("usb transfer interrupted".into()));
        }
        Ok(self.image.clone())
    }

    fn get_setting(&mut self, name: &str) -> Result<String, CameraError> {
        match (name, &self.battery) {
            ("batterylevel", Some(level)) => Ok(level.clone()),
            _ => Err(CameraError::Device(format!("no such setting: {}", name))),
        }
    }

    fn set_setting(&mut self, name: &str, value: &SettingValue) -> Result<(), CameraError> {
        let mut log = self.log.lock();
        if !log.is_open {
            return Err(CameraError::Device("set_setting on closed camera".into()));
        }
        log.settings.push((name.to_string(), value.clone()));
        Ok(())
    }

    fn close(&mut self) -> Result<(), CameraError> {
        let mut log = self.log.lock();
        log.close_calls += 1;
        log.is_open = false;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PrinterLog {
    pub connect_calls: u32,
    pub disconnect_calls: u32,
    pub sent: Vec<(String, Vec<u8>)>,
}

#[derive(Debug, Clone)]
pub struct FakePrinter {
    pub log: Arc<Mutex<PrinterLog>>,
    reachable: bool,
    send_error: Option<PrinterError>,
}

impl FakePrinter {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(PrinterLog::default())),
            reachable: true,
            send_error: None,
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn send_error(mut self, error: PrinterError) -> Self {
        self.send_error = Some(error);
        self
    }
}

impl PrinterTransport for FakePrinter {
    fn connect(&mut self) -> Result<(), PrinterError> {
        self.log.lock().connect_calls += 1;
        if self.reachable {
            Ok(())
        } else {
            Err(PrinterError::Unreachable("host is down".into()))
        }
    }

    fn send_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), PrinterError> {
        if let Some(err) = &self.send_error {
            return Err(err.clone());
        }
        self.log.lock().sent.push((name.to_string(), bytes.to_vec()));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), PrinterError> {
        self.log.lock().disconnect_calls += 1;
        Ok(())
    }
}

/// Fallback camera that writes a JPEG straight to the requested path.
#[derive(Debug, Clone)]
pub struct FakeStill {
    pub calls: Arc<Mutex<u32>>,
    fail: bool,
    bytes: Vec<u8>,
}

impl FakeStill {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(0)),
            fail: false,
            bytes: jpeg_bytes(32, 24),
        }
    }

    /// Write `bytes` instead of a valid JPEG.
    pub fn writing(bytes: Vec<u8>) -> Self {
        Self { bytes, ..Self::new() }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl StillCapture for FakeStill {
    fn capture_to(&mut self, path: &Path) -> Result<(), CameraError> {
        *self.calls.lock() += 1;
        if self.fail {
            return Err(CameraError::Device("camera module not detected".into()));
        }
        std::fs::write(path, &self.bytes).map_err(|e| CameraError::Storage(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Overlay(Overlay, String),
    Image { width: u32, height: u32 },
    Clear,
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum Reaction {
    Push(TouchEvent),
    CloseBus,
}

#[derive(Default)]
struct RendererState {
    events: Vec<DisplayEvent>,
    reactions: Vec<(Overlay, Reaction)>,
    image_reactions: Vec<Reaction>,
    fail_on: Option<Overlay>,
}

/// Renderer that records every directive and can react to overlays by
/// touching the bus, standing in for a user in front of the screen.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    state: Arc<Mutex<RendererState>>,
    bus: Option<TouchEventBus>,
}

impl RecordingRenderer {
    pub fn new(bus: &TouchEventBus) -> Self {
        Self {
            state: Arc::default(),
            bus: Some(bus.clone()),
        }
    }

    /// The first time `overlay` is shown after earlier reactions fired, run `reaction`.
    pub fn on(&self, overlay: Overlay, reaction: Reaction) -> &Self {
        self.state.lock().reactions.push((overlay, reaction));
        self
    }

    /// Run `reaction` the next time a photo is shown, after any queued before it.
    pub fn on_image(&self, reaction: Reaction) -> &Self {
        self.state.lock().image_reactions.push(reaction);
        self
    }

    pub fn fail_on(&self, overlay: Overlay) {
        self.state.lock().fail_on = Some(overlay);
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.state.lock().events.clone()
    }

    /// Overlay names and `image` markers, in order, without clears.
    pub fn sequence(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DisplayEvent::Overlay(overlay, _) => Some(overlay.asset_name()),
                DisplayEvent::Image { .. } => Some("image".into()),
                DisplayEvent::Clear | DisplayEvent::Shutdown => None,
            })
            .collect()
    }

    pub fn messages_for(&self, wanted: Overlay) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DisplayEvent::Overlay(overlay, message) if overlay == wanted => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl RecordingRenderer {
    fn react(&self, reaction: Option<Reaction>) {
        if let (Some(reaction), Some(bus)) = (reaction, &self.bus) {
            match reaction {
                Reaction::Push(touch) => bus.push(touch),
                Reaction::CloseBus => bus.close(),
            }
        }
    }
}

impl DisplayRenderer for RecordingRenderer {
    fn show_overlay(&self, overlay: Overlay, message: &str) -> Result<(), DisplayError> {
        let reaction = {
            let mut state = self.state.lock();
            if state.fail_on == Some(overlay) {
                return Err(DisplayError::MissingAsset(overlay.asset_name()));
            }
            state.events.push(DisplayEvent::Overlay(overlay, message.to_string()));
            let index = state.reactions.first().filter(|(o, _)| *o == overlay).map(|_| 0);
            index.map(|i| state.reactions.remove(i).1)
        };
        self.react(reaction);
        Ok(())
    }

    fn show_image(&self, image: &RgbaImage) -> Result<(), DisplayError> {
        let reactions = {
            let mut state = self.state.lock();
            state.events.push(DisplayEvent::Image {
                width: image.width(),
                height: image.height(),
            });
            std::mem::take(&mut state.image_reactions)
        };
        for reaction in reactions {
            self.react(Some(reaction));
        }
        Ok(())
    }

    fn clear_image(&self) -> Result<(), DisplayError> {
        self.state.lock().events.push(DisplayEvent::Clear);
        Ok(())
    }

    fn shutdown(&self) {
        self.state.lock().events.push(DisplayEvent::Shutdown);
    }
}

#[derive(Default)]
pub struct RecordingDelegate {
    pub phases: Mutex<Vec<SessionPhase>>,
    pub captures: Mutex<Vec<CaptureSession>>,
    pub camera_errors: Mutex<Vec<CameraError>>,
    pub prints: Mutex<Vec<bool>>,
}

impl RecordingDelegate {
    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.lock().iter().map(SessionPhase::name).collect()
    }
}

impl SessionDelegate for RecordingDelegate {
    fn on_phase_changed(&self, phase: &SessionPhase) {
        self.phases.lock().push(phase.clone());
    }

    fn on_capture_finished(&self, session: &CaptureSession) {
        self.captures.lock().push(session.clone());
    }

    fn on_camera_error(&self, error: &CameraError) {
        self.camera_errors.lock().push(error.clone());
    }

    fn on_print_finished(&self, printed: bool) {
        self.prints.lock().push(printed);
    }
}
