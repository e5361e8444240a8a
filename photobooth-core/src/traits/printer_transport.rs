use crate::models::error::PrinterError;

/// Interface for the link to a physical printer.
///
/// Implemented by:
/// - `ObexFtpPrinter` (Bluetooth OBEX push)
/// - `SpoolDirPrinter` (writes jobs to a directory)
pub trait PrinterTransport: Send {
    /// Establish the link. `PrinterError::Unreachable` when the printer is
    /// off or out of range.
    fn connect(&mut self) -> Result<(), PrinterError>;

    /// Push one encoded image under `name`.
    fn send_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), PrinterError>;

    /// Tear the link down.
    fn disconnect(&mut self) -> Result<(), PrinterError>;
}

impl<T: PrinterTransport + ?Sized> PrinterTransport for Box<T> {
    fn connect(&mut self) -> Result<(), PrinterError> {
        (**self).connect()
    }

    fn send_file(&mut self, name: &str, bytes: &[u8]) -> Result<(), PrinterError> {
        (**self).send_file(name, bytes)
    }

    fn disconnect(&mut self) -> Result<(), PrinterError> {
        (**self).disconnect()
    }
}
