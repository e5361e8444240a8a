//! # photobooth-linux
//!
//! Linux / Raspberry Pi backends for photobooth-core.
//!
//! Provides:
//! - `EvdevTouchscreen`: touch presses read from an evdev input device
//! - `GphotoCamera`: tethered DSLR driven through the `gphoto2` command line
//! - `RpicamStill`: Raspberry Pi camera module via `rpicam-still`
//! - `ObexFtpPrinter`: Bluetooth printer reached with `obexftp`
//! - `SpoolDirPrinter`: print jobs dropped into a directory
//! - `FramebufferRenderer`: overlays and photos drawn on `/dev/fbN`
//!
//! ## Platform Requirements
//! - Linux with evdev and fbdev
//! - `gphoto2`, `rpicam-still` and `obexftp` on `PATH` for the backends that use them
//!
//! ## Usage
//! ```ignore
//! use photobooth_core::{TouchEventBus, TouchSource};
//! use photobooth_linux::EvdevTouchscreen;
//!
//! let bus = TouchEventBus::new();
//! let mut touchscreen = EvdevTouchscreen::new("/dev/input/event0");
//! touchscreen.start(bus.sink()).unwrap();
//! ```

#[cfg(target_os = "linux")]
mod command;
pub mod overlay_assets;
pub mod spool_printer;

#[cfg(target_os = "linux")]
pub mod evdev_touch;
#[cfg(target_os = "linux")]
pub mod framebuffer;
#[cfg(target_os = "linux")]
pub mod gphoto_camera;
#[cfg(target_os = "linux")]
pub mod obex_printer;
#[cfg(target_os = "linux")]
pub mod rpicam_still;

pub use overlay_assets::{OverlaySet, OverlaySettings};
pub use spool_printer::SpoolDirPrinter;

#[cfg(target_os = "linux")]
pub use evdev_touch::EvdevTouchscreen;
#[cfg(target_os = "linux")]
pub use framebuffer::FramebufferRenderer;
#[cfg(target_os = "linux")]
pub use gphoto_camera::GphotoCamera;
#[cfg(target_os = "linux")]
pub use obex_printer::ObexFtpPrinter;
#[cfg(target_os = "linux")]
pub use rpicam_still::RpicamStill;
