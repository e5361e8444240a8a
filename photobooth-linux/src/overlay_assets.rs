//! Overlay asset loading and the message caption.
//!
//! Each overlay is a `<name>.png` in the overlay directory. Assets are
//! smaller than the screen: they are anchored to the bottom-left corner,
//! lifted by `pad_y`, and mirrored to match the physical display.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::path::Path;

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use image::imageops;
use image::{Rgba, RgbaImage};

use photobooth_core::models::config::OverlayConfig;
use photobooth_core::models::error::DisplayError;
use photobooth_core::models::overlay::Overlay;

/// Distance between the top of the screen and the caption.
const CAPTION_TOP: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlaySettings {
    pub width: u32,
    pub height: u32,
    pub hflip: bool,
    pub vflip: bool,
    pub pad_y: u32,
}

impl OverlaySettings {
    pub fn from_config(config: &OverlayConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            hflip: config.hflip,
            vflip: config.vflip,
            pad_y: config.pad_y,
        }
    }
}

/// Place an asset on a transparent overlay-sized canvas.
pub fn pad_overlay(asset: &RgbaImage, settings: &OverlaySettings) -> RgbaImage {
    let mut padded = RgbaImage::new(settings.width, settings.height);
    let y = i64::from(settings.height) - i64::from(asset.height()) - i64::from(settings.pad_y);
    imageops::replace(&mut padded, asset, 0, y);
    if settings.hflip {
        imageops::flip_horizontal_in_place(&mut padded);
    }
    if settings.vflip {
        imageops::flip_vertical_in_place(&mut padded);
    }
    padded
}

/// Every overlay the session can ask for, ready to composite.
pub struct OverlaySet {
    images: HashMap<String, RgbaImage>,
}

impl OverlaySet {
    /// Load `*.png` from `dir`. Fails unless every overlay in `Overlay::ALL` is present.
    pub fn load(dir: &Path, settings: &OverlaySettings) -> Result<Self, DisplayError> {
        let entries = fs::read_dir(dir)
            .map_err(|e| DisplayError::Device(format!("overlay directory {}: {}", dir.display(), e)))?;

        let mut images = HashMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let asset = image::open(&path)
                .map_err(|e| DisplayError::Device(format!("{}: {}", path.display(), e)))?
                .to_rgba8();
            log::debug!("Loaded '{}' overlay", name);
            images.insert(name, pad_overlay(&asset, settings));
        }

        let set = Self { images };
        for overlay in Overlay::ALL {
            set.get(overlay)?;
        }
        Ok(set)
    }

    pub fn get(&self, overlay: Overlay) -> Result<&RgbaImage, DisplayError> {
        let name = overlay.asset_name();
        self.images.get(&name).ok_or(DisplayError::MissingAsset(name))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// `DrawTarget` over an RGBA frame, clipping to its bounds.
struct Canvas<'a>(&'a mut RgbaImage);

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.0.dimensions();
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x < width && y < height {
                self.0.put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
            }
        }
        Ok(())
    }
}

/// Write `message` centred along the top edge, white on black.
pub fn draw_caption(frame: &mut RgbaImage, message: &str) {
    if message.is_empty() {
        return;
    }
    let character_style = MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(Rgb888::WHITE)
        .background_color(Rgb888::BLACK)
        .build();
    let text_style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    let centre = i32::try_from(frame.width() / 2).unwrap_or(i32::MAX);

    let mut canvas = Canvas(frame);
    let _ = Text::with_text_style(message, Point::new(centre, CAPTION_TOP), character_style, text_style)
        .draw(&mut canvas);
}
