use std::sync::Arc;

use crate::models::error::TouchError;
use crate::models::touch::TouchEvent;

/// Callback invoked for every press the touch source detects.
///
/// Fires on the touch source's own thread. Implementations forward the event
/// and return immediately; see `TouchEventBus::sink`.
pub type TouchSink = Arc<dyn Fn(TouchEvent) + Send + Sync + 'static>;

/// Interface for hardware that reports screen presses.
///
/// Implemented by:
/// - `EvdevTouchscreen` (Linux input subsystem)
pub trait TouchSource: Send {
    /// Start reading presses, delivering each one via `sink`.
    fn start(&mut self, sink: TouchSink) -> Result<(), TouchError>;

    /// Stop reading and release the device.
    fn stop(&mut self) -> Result<(), TouchError>;

    /// Human-readable description of the device backing this source.
    fn describe(&self) -> String;
}
