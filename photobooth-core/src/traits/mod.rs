pub mod camera_device;
pub mod display_renderer;
pub mod printer_transport;
pub mod session_delegate;
pub mod still_capture;
pub mod touch_source;
