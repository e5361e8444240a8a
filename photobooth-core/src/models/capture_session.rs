use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Result of one bounded capture run by the capture controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A photo was taken and saved locally.
    Success { path: PathBuf, attempts: u32 },
    /// Every attempt failed; no photo this session.
    Exhausted { attempts: u32 },
}

impl CaptureOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Exhausted { attempts } => *attempts,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Success { path, .. } => Some(path),
            Self::Exhausted { .. } => None,
        }
    }
}

/// How a capture phase ended, as reported to the session delegate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptureResult {
    Success { path: PathBuf },
    Failure { reason: String },
}

/// One photograph attempt, from the cheese overlay to the saved file (or not).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureSession {
    pub requested_at: DateTime<Local>,
    pub attempts_made: u32,
    pub outcome: CaptureResult,
}

impl CaptureSession {
    pub fn succeeded(requested_at: DateTime<Local>, attempts_made: u32, path: PathBuf) -> Self {
        Self {
            requested_at,
            attempts_made,
            outcome: CaptureResult::Success { path },
        }
    }

    pub fn failed(requested_at: DateTime<Local>, attempts_made: u32, reason: impl Into<String>) -> Self {
        Self {
            requested_at,
            attempts_made,
            outcome: CaptureResult::Failure {
                reason: reason.into(),
            },
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match &self.outcome {
            CaptureResult::Success { path } => Some(path),
            CaptureResult::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CaptureResult::Success { .. })
    }
}
