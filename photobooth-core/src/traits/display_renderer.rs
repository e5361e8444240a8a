use image::RgbaImage;

use crate::models::error::DisplayError;
use crate::models::overlay::Overlay;

/// Interface for the screen in front of the user.
///
/// The renderer owns asset lookup and compositing. It keeps two layers: an
/// optional full-screen photo and a single overlay drawn on top of it (or on
/// top of the live preview when no photo is shown).
pub trait DisplayRenderer: Send + Sync {
    /// Replace the overlay layer. A non-empty `message` is shown with it.
    fn show_overlay(&self, overlay: Overlay, message: &str) -> Result<(), DisplayError>;

    /// Show a full-screen photo under the overlay layer.
    fn show_image(&self, image: &RgbaImage) -> Result<(), DisplayError>;

    /// Remove the photo and the overlay, returning to the live preview.
    fn clear_image(&self) -> Result<(), DisplayError>;

    /// Release the display. Called once on process exit.
    fn shutdown(&self);
}
