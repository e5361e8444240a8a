use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Complete kiosk configuration, loaded once at startup.
///
/// Every section falls back to its defaults, so a config file only needs the
/// keys that differ from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    pub general: GeneralConfig,
    pub camera: CameraConfig,
    pub printer: PrinterConfig,
    pub overlay: OverlayConfig,
    pub touchscreen: TouchscreenConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Physical screen width in pixels.
    pub screen_width: u32,

    /// Physical screen height in pixels.
    pub screen_height: u32,

    /// Pause between clearing the photo and showing the intro again, in seconds.
    pub return_delay: f64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            screen_width: 800,
            screen_height: 480,
            return_delay: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Use the tethered DSLR. When false, the fallback still camera is used.
    pub dslr_enabled: bool,

    /// Capture attempts per session before giving up (at least 1).
    pub max_retries: u32,

    /// Pushed to the camera as the `burstnumber` setting at startup.
    pub burst_count: u32,

    /// Pushed to the camera as the `iso` setting at startup, when set.
    pub iso: Option<String>,

    /// Seconds between countdown steps (0 disables the countdown).
    pub countdown_delay: f64,

    /// Battery percentage at or below which the low-battery warning is shown.
    pub battery_warning: u8,

    /// Seconds the photo stays on screen when printing is disabled.
    pub review_timeout: f64,

    /// Directory where captured photos are saved.
    pub output_dir: PathBuf,

    /// Additional named settings pushed to the camera at startup.
    pub settings: BTreeMap<String, String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            dslr_enabled: true,
            max_retries: 3,
            burst_count: 1,
            iso: None,
            countdown_delay: 1.0,
            battery_warning: 20,
            review_timeout: 5.0,
            output_dir: PathBuf::from("captures"),
            settings: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    pub enabled: bool,

    /// Print every photo without asking for confirmation.
    pub print_everything: bool,

    /// Print image width in pixels.
    pub width: u32,

    /// Print image height in pixels.
    pub height: u32,

    /// Encoding sent to the printer: `JPEG`, `PNG` or `BMP`.
    pub format: String,

    /// Bluetooth address of the printer.
    pub address: String,

    /// RFCOMM channel of the printer's OBEX push service.
    pub channel: u8,

    /// Write print jobs into this directory instead of sending them over Bluetooth.
    pub spool_dir: Option<PathBuf>,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            print_everything: false,
            width: 1280,
            height: 1920,
            format: "JPEG".into(),
            address: "00:00:00:00:00:00".into(),
            channel: 4,
            spool_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub width: u32,
    pub height: u32,

    /// The physical display is mirrored horizontally.
    pub hflip: bool,

    /// The physical display is mirrored vertically.
    pub vflip: bool,

    /// Distance between the bottom edge of an overlay asset and the screen edge.
    pub pad_y: u32,

    /// Directory holding the `<name>.png` overlay assets.
    pub directory: PathBuf,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            hflip: false,
            vflip: false,
            pad_y: 0,
            directory: PathBuf::from("overlays"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchscreenConfig {
    pub device: PathBuf,

    /// Treat a touch at exactly (0, 0) as driver noise rather than a trigger.
    pub ignore_null_touches: bool,
}

impl Default for TouchscreenConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/input/event0"),
            ignore_null_touches: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub framebuffer: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            framebuffer: PathBuf::from("/dev/fb0"),
        }
    }
}

/// Encoding used for images sent to the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintFormat {
    Jpeg,
    Png,
    Bmp,
}

impl PrintFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl BoothConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.general.screen_width == 0 || self.general.screen_height == 0 {
            return Err("screen dimensions must be non-zero".into());
        }
        if self.overlay.width == 0 || self.overlay.height == 0 {
            return Err("overlay dimensions must be non-zero".into());
        }
        if self.camera.max_retries == 0 {
            return Err("camera.max_retries must be at least 1".into());
        }
        if self.camera.battery_warning > 100 {
            return Err(format!(
                "camera.battery_warning must be a percentage, got {}",
                self.camera.battery_warning
            ));
        }
        for (name, secs) in [
            ("general.return_delay", self.general.return_delay),
            ("camera.countdown_delay", self.camera.countdown_delay),
            ("camera.review_timeout", self.camera.review_timeout),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(format!("{} must be a non-negative number of seconds", name));
            }
        }
        if self.printer.enabled {
            if self.printer.width == 0 || self.printer.height == 0 {
                return Err("printer dimensions must be non-zero".into());
            }
            if PrintFormat::parse(&self.printer.format).is_none() {
                return Err(format!("unsupported print format: {}", self.printer.format));
            }
        }
        Ok(())
    }

    pub fn countdown_delay(&self) -> Duration {
        Duration::from_secs_f64(self.camera.countdown_delay)
    }

    pub fn review_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.camera.review_timeout)
    }

    pub fn return_delay(&self) -> Duration {
        Duration::from_secs_f64(self.general.return_delay)
    }

    /// Falls back to JPEG if the configured format is unknown.
    pub fn print_format(&self) -> PrintFormat {
        PrintFormat::parse(&self.printer.format).unwrap_or(PrintFormat::Jpeg)
    }

    /// Display geometry used to interpret print-confirmation touches.
    pub fn touch_geometry(&self) -> crate::models::touch::ScreenGeometry {
        crate::models::touch::ScreenGeometry {
            width: self.general.screen_width,
            height: self.general.screen_height,
            hflip: self.overlay.hflip,
            vflip: self.overlay.vflip,
        }
    }

    /// Named camera settings pushed once when the capture controller starts.
    pub fn startup_settings(&self) -> BTreeMap<String, String> {
        let mut settings = self.camera.settings.clone();
        settings.insert("burstnumber".into(), self.camera.burst_count.to_string());
        if let Some(iso) = &self.camera.iso {
            settings.insert("iso".into(), iso.clone());
        }
        settings
    }
}
