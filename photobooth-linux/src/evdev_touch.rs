//! evdev touchscreen source.
//!
//! Reads raw `input_event` records from a `/dev/input/eventN` node on a
//! dedicated thread and reports one `TouchEvent` per finger-down on the
//! first contact slot. Works with multitouch (type B slots) and legacy
//! single-touch panels.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use photobooth_core::models::error::TouchError;
use photobooth_core::models::touch::TouchEvent;
use photobooth_core::traits::touch_source::{TouchSink, TouchSource};

/// `struct input_event` on 64-bit Linux: 16 bytes of timeval, then type, code, value.
pub const EVENT_SIZE: usize = 24;

const O_NONBLOCK: i32 = 0o4000;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;

const SYN_REPORT: u16 = 0x00;
const BTN_TOUCH: u16 = 0x14a;
const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;
const ABS_MT_SLOT: u16 = 0x2f;
const ABS_MT_POSITION_X: u16 = 0x35;
const ABS_MT_POSITION_Y: u16 = 0x36;
const ABS_MT_TRACKING_ID: u16 = 0x39;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn parse(record: &[u8; EVENT_SIZE]) -> Self {
        Self {
            kind: u16::from_ne_bytes([record[16], record[17]]),
            code: u16::from_ne_bytes([record[18], record[19]]),
            value: i32::from_ne_bytes([record[20], record[21], record[22], record[23]]),
        }
    }
}

/// Turns the event stream into presses on slot 0.
///
/// A press is reported at the `SYN_REPORT` that closes the frame in which the
/// finger went down, so its coordinates are the ones reported in that frame.
#[derive(Debug, Default)]
pub struct PressTracker {
    slot: i32,
    multitouch: bool,
    x: i32,
    y: i32,
    down: bool,
    pending: bool,
}

impl PressTracker {
    pub fn feed(&mut self, event: RawEvent) -> Option<TouchEvent> {
        match (event.kind, event.code) {
            (EV_ABS, ABS_MT_SLOT) => {
                self.multitouch = true;
                self.slot = event.value;
            }
            (EV_ABS, ABS_MT_TRACKING_ID) if self.slot == 0 => {
                self.multitouch = true;
                self.set_contact(event.value >= 0);
            }
            (EV_ABS, ABS_MT_POSITION_X) if self.slot == 0 => {
                self.multitouch = true;
                self.x = event.value;
            }
            (EV_ABS, ABS_MT_POSITION_Y) if self.slot == 0 => {
                self.multitouch = true;
                self.y = event.value;
            }
            (EV_ABS, ABS_X) if !self.multitouch => self.x = event.value,
            (EV_ABS, ABS_Y) if !self.multitouch => self.y = event.value,
            (EV_KEY, BTN_TOUCH) if !self.multitouch => self.set_contact(event.value != 0),
            (EV_SYN, SYN_REPORT) if self.pending => {
                self.pending = false;
                return Some(TouchEvent::new(self.x, self.y));
            }
            _ => {}
        }
        None
    }

    fn set_contact(&mut self, touching: bool) {
        if touching && !self.down {
            self.pending = true;
        }
        if !touching {
            self.pending = false;
        }
        self.down = touching;
    }
}

/// Touchscreen backed by a Linux input device node.
pub struct EvdevTouchscreen {
    device: PathBuf,
    running: Arc<AtomicBool>,
    reader_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl EvdevTouchscreen {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            running: Arc::new(AtomicBool::new(false)),
            reader_handle: Mutex::new(None),
        }
    }
}

impl TouchSource for EvdevTouchscreen {
    fn start(&mut self, sink: TouchSink) -> Result<(), TouchError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(TouchError::AlreadyRunning);
        }

        let file = OpenOptions::new()
            .read(true)
            .custom_flags(O_NONBLOCK)
            .open(&self.device)
            .map_err(|e| TouchError::DeviceNotAvailable(format!("{}: {}", self.device.display(), e)))?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let handle = thread::Builder::new()
            .name("touch-reader".into())
            .spawn(move || {
                if let Err(e) = read_loop(&running, file, &sink) {
                    log::error!("Touchscreen read error: {}", e);
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| TouchError::Unknown(format!("failed to spawn touch thread: {}", e)))?;

        *self.reader_handle.lock() = Some(handle);
        log::info!("Listening for touches on {}", self.device.display());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TouchError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader_handle.lock().take() {
            handle
                .join()
                .map_err(|_| TouchError::Unknown("touch reader thread panicked".into()))?;
            log::info!("Stopped listening on {}", self.device.display());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("evdev touchscreen at {}", self.device.display())
    }
}

impl Drop for EvdevTouchscreen {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Error stopping touchscreen: {}", e);
        }
    }
}

/// Poll the non-blocking device until `running` is cleared.
fn read_loop(running: &AtomicBool, mut file: File, sink: &TouchSink) -> std::io::Result<()> {
    let mut tracker = PressTracker::default();
    let mut buf = [0u8; EVENT_SIZE * 64];

    while running.load(Ordering::SeqCst) {
        let read = match file.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(e) => return Err(e),
        };

        // The kernel only hands out whole records.
        for chunk in buf[..read].chunks_exact(EVENT_SIZE) {
            let Ok(record) = <&[u8; EVENT_SIZE]>::try_from(chunk) else {
                continue;
            };
            if let Some(touch) = tracker.feed(RawEvent::parse(record)) {
                sink(touch);
            }
        }
    }
    Ok(())
}
