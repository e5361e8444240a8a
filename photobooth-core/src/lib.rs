//! # photobooth-core
//!
//! Platform-agnostic photobooth session core.
//!
//! Provides the touch event bus, the capture and print controllers, photo
//! storage and the session orchestrator that drives the kiosk. Hardware
//! backends (evdev touchscreens, gphoto2 cameras, OBEX printers, Linux
//! framebuffers) implement the traits in `traits/` and plug into the
//! generic `SessionOrchestrator`.
//!
//! ## Architecture
//!
//! ```text
//! photobooth-core (this crate)
//! ├── traits/       ← TouchSource, CameraDevice, StillCapture, PrinterTransport, DisplayRenderer, SessionDelegate
//! ├── models/       ← BoothError, BoothConfig, SessionPhase, Overlay, TouchEvent, CaptureSession
//! ├── bus/          ← TouchEventBus (touch thread → session thread)
//! ├── controllers/  ← CaptureController (retries, battery), PrintController
//! ├── session/      ← SessionOrchestrator (kiosk state machine)
//! └── storage/      ← capture file naming and saving
//! ```

pub mod bus;
pub mod controllers;
pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use bus::touch_event_bus::{PopMode, TouchEventBus};
pub use controllers::capture::CaptureController;
pub use controllers::print::{PrintController, PrintSettings};
pub use models::capture_session::{CaptureOutcome, CaptureResult, CaptureSession};
pub use models::config::{BoothConfig, PrintFormat};
pub use models::error::{BoothError, CameraError, ConfigError, DisplayError, PrinterError, TouchError};
pub use models::overlay::Overlay;
pub use models::state::SessionPhase;
pub use models::touch::{PrintDecision, ScreenGeometry, TouchEvent};
pub use session::orchestrator::{CameraBackend, SessionOrchestrator, SessionSettings};
pub use traits::camera_device::{CameraDevice, CameraFile, SettingValue};
pub use traits::display_renderer::DisplayRenderer;
pub use traits::printer_transport::PrinterTransport;
pub use traits::session_delegate::SessionDelegate;
pub use traits::still_capture::StillCapture;
pub use traits::touch_source::{TouchSink, TouchSource};
