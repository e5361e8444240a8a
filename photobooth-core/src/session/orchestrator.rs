use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::bus::touch_event_bus::{PopMode, TouchEventBus};
use crate::controllers::capture::CaptureController;
use crate::controllers::print::PrintController;
use crate::models::capture_session::{CaptureOutcome, CaptureSession};
use crate::models::config::BoothConfig;
use crate::models::error::{BoothError, CameraError};
use crate::models::overlay::Overlay;
use crate::models::state::SessionPhase;
use crate::models::touch::{PrintDecision, ScreenGeometry, TouchEvent};
use crate::storage::photo_store;
use crate::traits::camera_device::CameraDevice;
use crate::traits::display_renderer::DisplayRenderer;
use crate::traits::printer_transport::PrinterTransport;
use crate::traits::session_delegate::SessionDelegate;
use crate::traits::still_capture::StillCapture;

/// Pause between failed capture attempts.
pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Shown with the intro overlay when a session ends without a photo.
pub const APOLOGY_MESSAGE: &str = "Oops, couldn't take photo! Try again!";

const COUNTDOWN_FROM: u8 = 3;

/// Where photos come from.
pub enum CameraBackend<C: CameraDevice> {
    /// Tethered camera with connection management and retries.
    Dslr(CaptureController<C>),
    /// Single-shot fallback camera writing into `output_dir`.
    Still {
        camera: Box<dyn StillCapture>,
        output_dir: PathBuf,
    },
}

/// Per-process session policy, taken from the configuration at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub countdown_delay: Duration,
    pub review_timeout: Duration,
    pub return_delay: Duration,
    pub retry_delay: Duration,
    pub max_retries: u32,
    pub battery_warning: u8,
    pub print_everything: bool,
    pub ignore_null_touches: bool,
    pub geometry: ScreenGeometry,
}

impl SessionSettings {
    pub fn from_config(config: &BoothConfig) -> Self {
        Self {
            countdown_delay: config.countdown_delay(),
            review_timeout: config.review_timeout(),
            return_delay: config.return_delay(),
            retry_delay: CAPTURE_RETRY_DELAY,
            max_retries: config.camera.max_retries,
            battery_warning: config.camera.battery_warning,
            print_everything: config.printer.print_everything,
            ignore_null_touches: config.touchscreen.ignore_null_touches,
            geometry: config.touch_geometry(),
        }
    }
}

/// The kiosk state machine.
///
/// Runs on a single thread: every phase transition, camera call, printer
/// call and display update happens in order, with no parallelism inside a
/// session. Touches that arrive mid-session stay queued and are discarded
/// when the session returns to idle.
///
/// ```text
/// [TouchSource] → [TouchEventBus] → [SessionOrchestrator] ─┬→ [CaptureController] → camera
///                                                          ├→ [PrintController]   → printer
///                                                          └→ [DisplayRenderer]
/// ```
pub struct SessionOrchestrator<C: CameraDevice, P: PrinterTransport> {
    bus: TouchEventBus,
    camera: CameraBackend<C>,
    printer: Option<PrintController<P>>,
    renderer: Arc<dyn DisplayRenderer>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    settings: SessionSettings,
    phase: SessionPhase,
    torn_down: bool,
}

impl<C: CameraDevice, P: PrinterTransport> SessionOrchestrator<C, P> {
    /// `printer` is `None` when printing is disabled.
    pub fn new(
        bus: TouchEventBus,
        camera: CameraBackend<C>,
        printer: Option<PrintController<P>>,
        renderer: Arc<dyn DisplayRenderer>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            bus,
            camera,
            printer,
            renderer,
            delegate: None,
            settings,
            phase: SessionPhase::Idle,
            torn_down: false,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn bus(&self) -> &TouchEventBus {
        &self.bus
    }

    /// Serve sessions until the touch bus is closed.
    ///
    /// Hardware faults never leave this loop; they end the current session
    /// instead. Only display failures are returned, since a kiosk that cannot
    /// draw cannot serve anyone.
    pub fn run(&mut self) -> Result<(), BoothError> {
        self.show(Overlay::Intro, "")?;
        while let Some(touch) = self.wait_for_trigger() {
            log::info!("Session triggered by touch at {},{}", touch.x, touch.y);
            self.run_session()?;
        }
        log::info!("Touch bus closed, leaving session loop");
        Ok(())
    }

    /// Block until a qualifying touch arrives, or `None` once the bus closes.
    pub fn wait_for_trigger(&mut self) -> Option<TouchEvent> {
        loop {
            let touch = self.bus.pop(PopMode::Blocking)?;
            log::debug!("Dequeued a touch");
            if touch.is_null() && self.settings.ignore_null_touches {
                log::debug!("Ignoring touch at {},{}", touch.x, touch.y);
                continue;
            }
            return Some(touch);
        }
    }

    /// One idle-to-idle traversal, ending with a drained touch bus.
    pub fn run_session(&mut self) -> Result<(), BoothError> {
        self.countdown()?;

        let Some((path, photo)) = self.capture_photo()? else {
            return self.enter_idle(APOLOGY_MESSAGE);
        };

        self.review(&path, &photo)?;
        self.enter_idle("")
    }

    /// Close the camera, the printer and the display. Safe to call twice.
    pub fn teardown(&mut self) {
        if self.torn_down {
            log::debug!("Already torn down");
            return;
        }
        log::info!("Tearing down camera, printer and display");
        if let CameraBackend::Dslr(controller) = &mut self.camera {
            controller.close();
        }
        if let Some(printer) = &mut self.printer {
            printer.disconnect();
        }
        self.renderer.shutdown();
        self.torn_down = true;
    }

    // --- Phases ---

    fn countdown(&mut self) -> Result<(), BoothError> {
        self.set_phase(SessionPhase::Countdown);
        let delay = self.settings.countdown_delay;
        if delay.is_zero() {
            log::debug!("Countdown disabled");
            return Ok(());
        }
        log::debug!("Starting countdown...");
        for step in (1..=COUNTDOWN_FROM).rev() {
            self.show(Overlay::Countdown(step), "")?;
            log::debug!("{}!", step);
            thread::sleep(delay);
        }
        Ok(())
    }

    /// Returns the saved and decoded photo, or `None` when the session has to
    /// be abandoned. A file that doesn't decode counts as no photo.
    fn capture_photo(&mut self) -> Result<Option<(PathBuf, DynamicImage)>, BoothError> {
        self.set_phase(SessionPhase::Capturing);
        log::debug!("Taking photo...");
        self.show(Overlay::Cheese, "")?;

        let requested_at = Local::now();
        let warning = self.battery_warning().unwrap_or_default();
        let mut camera_error = None;

        let mut session = match &mut self.camera {
            CameraBackend::Dslr(controller) => {
                let renderer = Arc::clone(&self.renderer);
                let mut display_error = None;
                let mut on_processing = || {
                    if let Err(e) = renderer.show_overlay(Overlay::PleaseWait, &warning) {
                        display_error = Some(e);
                    }
                };
                let result = controller.capture(
                    self.settings.max_retries,
                    self.settings.retry_delay,
                    Some(&mut on_processing),
                );
                if let Some(e) = display_error {
                    return Err(e.into());
                }

                match result {
                    Ok(CaptureOutcome::Success { path, attempts }) => {
                        CaptureSession::succeeded(requested_at, attempts, path)
                    }
                    Ok(CaptureOutcome::Exhausted { attempts }) => {
                        log::warn!("No photo after {} attempt(s)", attempts);
                        CaptureSession::failed(requested_at, attempts, "capture attempts exhausted")
                    }
                    Err(CameraError::NotConnected) => {
                        log::warn!("Camera isn't connected");
                        camera_error = Some(CameraError::NotConnected);
                        CaptureSession::failed(requested_at, 0, CameraError::NotConnected.to_string())
                    }
                    Err(e) => {
                        log::error!("Something went wrong whilst trying to take a photo: {}", e);
                        let reason = e.to_string();
                        camera_error = Some(e);
                        CaptureSession::failed(requested_at, 0, reason)
                    }
                }
            }
            CameraBackend::Still { camera, output_dir } => {
                let captured = photo_store::fallback_capture_path(output_dir)
                    .and_then(|path| camera.capture_to(&path).map(|()| path));
                match captured {
                    Ok(path) => {
                        log::info!("Saved photo to {}", path.display());
                        CaptureSession::succeeded(requested_at, 1, path)
                    }
                    Err(e) => {
                        log::error!("Fallback camera failed to take a photo: {}", e);
                        let reason = e.to_string();
                        camera_error = Some(e);
                        CaptureSession::failed(requested_at, 1, reason)
                    }
                }
            }
        };

        let mut photo = None;
        if let Some(path) = session.path().cloned() {
            match image::open(&path) {
                Ok(decoded) => photo = Some((path, decoded)),
                Err(e) => {
                    log::error!("Couldn't load captured photo {}: {}", path.display(), e);
                    session = CaptureSession::failed(
                        requested_at,
                        session.attempts_made,
                        format!("captured photo is unreadable: {}", e),
                    );
                }
            }
        }

        if let Some(delegate) = &self.delegate {
            if let Some(e) = &camera_error {
                delegate.on_camera_error(e);
            }
            delegate.on_capture_finished(&session);
        }
        Ok(photo)
    }

    fn review(&mut self, path: &Path, photo: &DynamicImage) -> Result<(), BoothError> {
        self.set_phase(SessionPhase::Reviewing {
            path: path.to_path_buf(),
        });
        log::debug!("Showing photo {}", path.display());

        let geometry = self.settings.geometry;
        self.renderer
            .show_image(&fit_to_screen(photo, geometry.width, geometry.height))?;

        if self.printer.is_none() {
            if !self.settings.review_timeout.is_zero() {
                thread::sleep(self.settings.review_timeout);
            }
            return Ok(());
        }

        if self.settings.print_everything || self.confirm_print()? {
            self.print(photo)?;
        }
        Ok(())
    }

    fn confirm_print(&mut self) -> Result<bool, BoothError> {
        self.set_phase(SessionPhase::PrintConfirm);
        let stale = self.bus.drain();
        if stale > 0 {
            log::debug!("Ignored {} touch(es) queued before the print prompt", stale);
        }
        self.show(Overlay::PrintConfirm, "")?;

        let Some(touch) = self.bus.pop(PopMode::Blocking) else {
            log::info!("Touch bus closed while waiting for print confirmation");
            return Ok(false);
        };
        let decision = self.settings.geometry.classify(touch);
        log::debug!("Print prompt touched at {},{}: {:?}", touch.x, touch.y, decision);
        Ok(decision == PrintDecision::Confirm)
    }

    fn print(&mut self, photo: &DynamicImage) -> Result<(), BoothError> {
        self.set_phase(SessionPhase::Printing);
        self.show(Overlay::Printing, "")?;

        let Some(printer) = &mut self.printer else {
            return Ok(());
        };
        let printed = printer.print(photo);
        if printed {
            log::info!("Photo sent to printer");
        } else {
            log::warn!("Photo was not printed");
        }
        if let Some(delegate) = &self.delegate {
            delegate.on_print_finished(printed);
        }
        Ok(())
    }

    /// Every session ends here, with or without a photo.
    fn enter_idle(&mut self, message: &str) -> Result<(), BoothError> {
        self.set_phase(SessionPhase::Idle);
        self.renderer.clear_image()?;
        if !self.settings.return_delay.is_zero() {
            thread::sleep(self.settings.return_delay);
        }
        self.show(Overlay::Intro, message)?;
        let discarded = self.bus.drain();
        if discarded > 0 {
            log::debug!("Ignored {} touch(es) queued during the session", discarded);
        } else {
            log::debug!("Touch queue empty");
        }
        Ok(())
    }

    // --- Internal helpers ---

    /// Show an overlay. Without an explicit message the low-battery warning
    /// rides along, so it stays visible for as long as the battery is low.
    fn show(&self, overlay: Overlay, message: &str) -> Result<(), BoothError> {
        log::debug!("show_overlay {}", overlay);
        let warning;
        let message = if message.is_empty() {
            warning = self.battery_warning().unwrap_or_default();
            warning.as_str()
        } else {
            message
        };
        self.renderer.show_overlay(overlay, message)?;
        Ok(())
    }

    fn battery_warning(&self) -> Option<String> {
        let CameraBackend::Dslr(controller) = &self.camera else {
            return None;
        };
        controller
            .battery_level()
            .filter(|level| *level <= self.settings.battery_warning)
            .map(|level| format!("Camera battery low! {}%", level))
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        log::debug!("Session phase {} -> {}", self.phase.name(), phase.name());
        self.phase = phase;
        if let Some(delegate) = &self.delegate {
            delegate.on_phase_changed(&self.phase);
        }
    }
}

/// Scale `photo` to cover the whole screen, cropping the overflow evenly.
pub fn fit_to_screen(photo: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    photo.resize_to_fill(width, height, FilterType::Triangle).to_rgba8()
}
