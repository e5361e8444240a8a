use thiserror::Error;

/// Errors raised by a camera device or the capture controller.
///
/// `NotConnected` is kept distinct from `Device` so the orchestrator can
/// report an absent camera without treating it as a malfunction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera not connected")]
    NotConnected,

    #[error("camera error: {0}")]
    Device(String),

    #[error("capture failed: {0}")]
    Transient(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors raised by a printer transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrinterError {
    #[error("printer unreachable: {0}")]
    Unreachable(String),

    #[error("print transfer failed: {0}")]
    Transfer(String),

    #[error("print encoding failed: {0}")]
    Encoding(String),
}

/// Errors raised by the display renderer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("overlay asset missing: {0}")]
    MissingAsset(String),

    #[error("display device error: {0}")]
    Device(String),
}

/// Errors raised by a touch source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TouchError {
    #[error("touch device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("touch source already running")]
    AlreadyRunning,

    #[error("touch source error: {0}")]
    Unknown(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Process-level error surfaced by the orchestrator's run loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoothError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Printer(#[from] PrinterError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Touch(#[from] TouchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
