use std::path::PathBuf;

/// Session state machine.
///
/// State transitions:
/// ```text
/// idle → countdown → capturing → reviewing → print_confirm → printing → idle
///                        ↓           ↓              ↓
///                       idle        idle           idle
/// ```
/// `print_confirm` and `printing` are skipped when printing is disabled;
/// `print_confirm` is skipped when every photo is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Countdown,
    Capturing,
    Reviewing { path: PathBuf },
    PrintConfirm,
    Printing,
}

impl SessionPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Countdown => "countdown",
            Self::Capturing => "capturing",
            Self::Reviewing { .. } => "reviewing",
            Self::PrintConfirm => "print_confirm",
            Self::Printing => "printing",
        }
    }
}

/// Connection state of the camera, owned by the capture controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraConnectionState {
    Closed,
    Open,
}

/// Connection state of the printer, owned by the print controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterConnectionState {
    Disconnected,
    Connected,
}
