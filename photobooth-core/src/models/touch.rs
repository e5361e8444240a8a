use serde::{Deserialize, Serialize};

/// A single press reported by the touch source, in raw screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TouchEvent {
    pub x: i32,
    pub y: i32,
}

impl TouchEvent {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Some touch controllers report a press at the origin when they glitch.
    pub fn is_null(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// Display geometry needed to map a raw touch onto what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
    pub hflip: bool,
    pub vflip: bool,
}

/// Outcome of the print-confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintDecision {
    Confirm,
    Decline,
}

impl ScreenGeometry {
    /// Mirror a raw touch into the coordinate space of the rendered image.
    pub fn mirror(&self, touch: TouchEvent) -> (i64, i64) {
        let x = if self.hflip {
            i64::from(self.width) - i64::from(touch.x)
        } else {
            i64::from(touch.x)
        };
        let y = if self.vflip {
            i64::from(self.height) - i64::from(touch.y)
        } else {
            i64::from(touch.y)
        };
        (x, y)
    }

    /// Only a touch strictly inside the bottom-right quadrant confirms.
    pub fn classify(&self, touch: TouchEvent) -> PrintDecision {
        if is_print_confirmation(
            touch.x,
            touch.y,
            self.width,
            self.height,
            self.hflip,
            self.vflip,
        ) {
            PrintDecision::Confirm
        } else {
            PrintDecision::Decline
        }
    }
}

/// Bottom-right quadrant test on mirrored coordinates.
///
/// Comparisons are done in doubled integer space so odd screen sizes split
/// exactly at the half pixel.
pub fn is_print_confirmation(
    x: i32,
    y: i32,
    screen_width: u32,
    screen_height: u32,
    hflip: bool,
    vflip: bool,
) -> bool {
    let geometry = ScreenGeometry {
        width: screen_width,
        height: screen_height,
        hflip,
        vflip,
    };
    let (mx, my) = geometry.mirror(TouchEvent::new(x, y));
    mx * 2 > i64::from(screen_width) && my * 2 > i64::from(screen_height)
}
