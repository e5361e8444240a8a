use std::io::Cursor;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::models::config::{BoothConfig, PrintFormat};
use crate::models::error::PrinterError;
use crate::models::state::PrinterConnectionState;
use crate::traits::printer_transport::PrinterTransport;

/// Size and encoding of images sent to the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintSettings {
    pub width: u32,
    pub height: u32,
    pub format: PrintFormat,
}

impl PrintSettings {
    pub fn from_config(config: &BoothConfig) -> Self {
        Self {
            width: config.printer.width,
            height: config.printer.height,
            format: config.print_format(),
        }
    }
}

/// Best-effort delivery of a finished photo to the printer.
///
/// One connection attempt and one push per print; an unreachable printer
/// is logged and reported as `false`, never as an error, so the kiosk can
/// go back to idle straight away.
pub struct PrintController<P: PrinterTransport> {
    transport: P,
    state: PrinterConnectionState,
    settings: PrintSettings,
}

impl<P: PrinterTransport> PrintController<P> {
    pub fn new(transport: P, settings: PrintSettings) -> Self {
        Self {
            transport,
            state: PrinterConnectionState::Disconnected,
            settings,
        }
    }

    pub fn connection_state(&self) -> PrinterConnectionState {
        self.state
    }

    /// Resize, encode and send `image`. The connection is always torn down
    /// afterwards. Returns whether the printer accepted the file.
    pub fn print(&mut self, image: &DynamicImage) -> bool {
        if !self.connect() {
            log::debug!("Giving up attempting to print because couldn't connect to printer");
            self.disconnect();
            return false;
        }

        let printed = match self.send(image) {
            Ok(filename) => {
                log::info!("Sent {} to printer", filename);
                true
            }
            Err(e) => {
                log::warn!("Print failed: {}", e);
                false
            }
        };
        self.disconnect();
        printed
    }

    /// Close the printer connection. Safe to call when already closed.
    pub fn disconnect(&mut self) {
        log::debug!("Closing printer connection");
        if self.state == PrinterConnectionState::Disconnected {
            log::debug!("Already closed printer connection");
            return;
        }
        if let Err(e) = self.transport.disconnect() {
            log::warn!("Couldn't close printer connection: {}", e);
        }
        self.state = PrinterConnectionState::Disconnected;
    }

    /// Resize to the configured print size and encode in the configured format.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, PrinterError> {
        let PrintSettings { width, height, format } = self.settings;
        log::debug!("Resizing image to {}x{}", width, height);
        let resized = image.resize_exact(width, height, FilterType::Triangle);
        // JPEG and BMP have no alpha channel.
        let resized = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut bytes = Vec::new();
        resized
            .write_to(&mut Cursor::new(&mut bytes), format.image_format())
            .map_err(|e| PrinterError::Encoding(e.to_string()))?;
        Ok(bytes)
    }

    fn connect(&mut self) -> bool {
        log::debug!("Connecting to printer");
        if self.state == PrinterConnectionState::Connected {
            log::debug!("Already connected to printer");
            return true;
        }
        match self.transport.connect() {
            Ok(()) => {
                self.state = PrinterConnectionState::Connected;
                true
            }
            Err(e) => {
                log::warn!("Couldn't connect to printer: {}", e);
                false
            }
        }
    }

    fn send(&mut self, image: &DynamicImage) -> Result<String, PrinterError> {
        let bytes = self.encode(image)?;
        let filename = format!("{}.{}", uuid::Uuid::new_v4(), self.settings.format.extension());
        log::debug!("Sending {} bytes to printer as {}", bytes.len(), filename);
        self.transport.send_file(&filename, &bytes)?;
        Ok(filename)
    }
}
