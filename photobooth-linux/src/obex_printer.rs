//! Bluetooth photo printer reached over OBEX File Transfer with `obexftp`.

use std::fs;
use std::path::PathBuf;

use photobooth_core::models::error::PrinterError;
use photobooth_core::traits::printer_transport::PrinterTransport;

use crate::command;

pub struct ObexFtpPrinter {
    address: String,
    channel: u8,
    staging_dir: PathBuf,
    connected: bool,
}

impl ObexFtpPrinter {
    /// `address` is the printer's Bluetooth MAC, `channel` its OBEX channel.
    pub fn new(address: impl Into<String>, channel: u8) -> Self {
        Self {
            address: address.into(),
            channel,
            staging_dir: std::env::temp_dir(),
            connected: false,
        }
    }

    fn link_args(&self) -> [String; 4] {
        [
            "--bluetooth".into(),
            self.address.clone(),
            "--channel".into(),
            self.channel.to_string(),
        ]
    }

    fn obexftp(&self, extra: &[&str]) -> Result<Vec<u8>, String> {
        let link = self.link_args();
        let mut args: Vec<&str> = link.iter().map(String::as_str).collect();
        args.extend_from_slice(extra);
        command::run("obexftp", &args)
    }
}

impl PrinterTransport for ObexFtpPrinter {
    fn connect(&mut self) -> Result<(), PrinterError> {
        if self.address.is_empty() {
            return Err(PrinterError::Unreachable("no printer address configured".into()));
        }
        // Listing the root folder proves the printer answers on this channel.
        self.obexftp(&["--list", "/"]).map_err(PrinterError::Unreachable)?;
        self.connected = true;
        Ok(())
    }

    fn send_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), PrinterError> {
        if !self.connected {
            return Err(PrinterError::Transfer("printer is not connected".into()));
        }
        let staged = self.staging_dir.join(name);
        fs::write(&staged, bytes)
            .map_err(|e| PrinterError::Transfer(format!("couldn't stage {}: {}", staged.display(), e)))?;

        let path = staged.to_string_lossy().into_owned();
        let result = self.obexftp(&["--put", &path]);
        if let Err(e) = fs::remove_file(&staged) {
            log::debug!("Couldn't remove staged print {}: {}", staged.display(), e);
        }
        result.map(|_| ()).map_err(PrinterError::Transfer)
    }

    fn disconnect(&mut self) -> Result<(), PrinterError> {
        self.connected = false;
        Ok(())
    }
}
