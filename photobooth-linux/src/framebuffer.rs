//! Linux framebuffer renderer.
//!
//! Keeps a photo layer and an overlay layer, composites them on every
//! change and writes the frame to the fbdev node as 32-bit BGRA. The
//! framebuffer is expected to be configured at the screen resolution
//! (`fbset -depth 32`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use image::imageops;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use photobooth_core::models::error::DisplayError;
use photobooth_core::models::overlay::Overlay;
use photobooth_core::traits::display_renderer::DisplayRenderer;

use crate::overlay_assets::{draw_caption, OverlaySet};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Default)]
struct Layers {
    photo: Option<RgbaImage>,
    overlay: Option<Overlay>,
    message: String,
    shut_down: bool,
}

pub struct FramebufferRenderer {
    device: PathBuf,
    width: u32,
    height: u32,
    overlays: OverlaySet,
    layers: Mutex<Layers>,
}

impl FramebufferRenderer {
    pub fn new(device: impl Into<PathBuf>, width: u32, height: u32, overlays: OverlaySet) -> Self {
        Self {
            device: device.into(),
            width,
            height,
            overlays,
            layers: Mutex::new(Layers::default()),
        }
    }

    fn compose(&self, layers: &Layers) -> Result<RgbaImage, DisplayError> {
        let mut frame = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        if let Some(photo) = &layers.photo {
            imageops::replace(&mut frame, photo, 0, 0);
        }
        if let Some(overlay) = layers.overlay {
            imageops::overlay(&mut frame, self.overlays.get(overlay)?, 0, 0);
        }
        draw_caption(&mut frame, &layers.message);
        Ok(frame)
    }

    fn flush(&self, frame: &RgbaImage) -> Result<(), DisplayError> {
        let bgra: Vec<u8> = frame
            .pixels()
            .flat_map(|Rgba([r, g, b, a])| [*b, *g, *r, *a])
            .collect();
        OpenOptions::new()
            .write(true)
            .open(&self.device)
            .and_then(|mut fb| fb.write_all(&bgra))
            .map_err(|e| DisplayError::Device(format!("{}: {}", self.device.display(), e)))
    }

    fn redraw(&self, layers: &Layers) -> Result<(), DisplayError> {
        let frame = self.compose(layers)?;
        self.flush(&frame)
    }
}

impl DisplayRenderer for FramebufferRenderer {
    fn show_overlay(&self, overlay: Overlay, message: &str) -> Result<(), DisplayError> {
        // Fail before touching the layers so a missing asset leaves the screen as it was.
        self.overlays.get(overlay)?;
        let mut layers = self.layers.lock();
        layers.overlay = Some(overlay);
        layers.message = message.to_string();
        if !message.is_empty() {
            log::info!("Display message: {}", message);
        }
        self.redraw(&layers)
    }

    fn show_image(&self, image: &RgbaImage) -> Result<(), DisplayError> {
        let mut layers = self.layers.lock();
        layers.photo = Some(image.clone());
        layers.overlay = None;
        self.redraw(&layers)
    }

    fn clear_image(&self) -> Result<(), DisplayError> {
        let mut layers = self.layers.lock();
        layers.photo = None;
        layers.overlay = None;
        layers.message.clear();
        self.redraw(&layers)
    }

    fn shutdown(&self) {
        let mut layers = self.layers.lock();
        if layers.shut_down {
            return;
        }
        *layers = Layers {
            shut_down: true,
            ..Layers::default()
        };
        if let Err(e) = self.redraw(&layers) {
            log::warn!("Couldn't blank display: {}", e);
        }
        log::debug!("Display released");
    }
}
