//! Border stripping: drop the printed scale bar.
//!
//! Specimen photographs carry a scale bar along their edges. Removing a
//! fixed fraction of the width and height from every side gets rid of it
//! before any analysis happens.

use crate::types::{CropWindow, Dimensions, PipelineError, RgbImage};

/// Window left after removing `percentage` of each axis from every edge.
///
/// Edges are `(w*p, h*p, w*(1-p), h*(1-p))`, truncated toward zero.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `percentage` is outside
/// `[0.0, 0.5)`. Returns [`PipelineError::ImageTooSmall`] if the
/// truncated window is empty.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn border_window(bounds: Dimensions, percentage: f64) -> Result<CropWindow, PipelineError> {
    if !(0.0..0.5).contains(&percentage) {
        return Err(PipelineError::InvalidConfig(format!(
            "border percentage must be in [0.0, 0.5), got {percentage}"
        )));
    }

    let w = f64::from(bounds.width);
    let h = f64::from(bounds.height);
    let left = (w * percentage) as u32;
    let top = (h * percentage) as u32;
    let right = (w * (1.0 - percentage)) as u32;
    let bottom = (h * (1.0 - percentage)) as u32;

    CropWindow::new(left, top, right, bottom).ok_or(PipelineError::ImageTooSmall(bounds))
}

/// Remove the scale-bar border from a photograph.
///
/// # Errors
///
/// See [`border_window`].
pub fn strip_border(image: &RgbImage, percentage: f64) -> Result<RgbImage, PipelineError> {
    let window = border_window(Dimensions::of(image), percentage)?;
    Ok(window.crop(image))
}
