use std::fs;
use std::path::PathBuf;

use photobooth_core::models::error::PrinterError;
use photobooth_core::traits::printer_transport::PrinterTransport;

/// Printer that drops each job into a spool directory for another process
/// (CUPS `lp`, a sync job, a human) to pick up.
///
/// Files are written under a temporary name and renamed into place, so a
/// watcher never sees a half-written job.
pub struct SpoolDirPrinter {
    dir: PathBuf,
}

impl SpoolDirPrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PrinterTransport for SpoolDirPrinter {
    fn connect(&mut self) -> Result<(), PrinterError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| PrinterError::Unreachable(format!("{}: {}", self.dir.display(), e)))
    }

    fn send_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), PrinterError> {
        let partial = self.dir.join(format!(".{}.part", name));
        let target = self.dir.join(name);
        fs::write(&partial, bytes)
            .and_then(|()| fs::rename(&partial, &target))
            .map_err(|e| PrinterError::Transfer(format!("{}: {}", target.display(), e)))?;
        log::debug!("Spooled {}", target.display());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), PrinterError> {
        Ok(())
    }
}
