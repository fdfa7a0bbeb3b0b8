//! Side strip extraction.
//!
//! The alternate views of the specimen sit in vertical strips along the
//! left and right edges of the stripped photograph.

use crate::types::{CropWindow, Dimensions, PipelineError, RgbImage, StripSide};

/// Window covering one side strip of an image.
///
/// Left strip: columns `[0, strip_width)`. Right strip: columns
/// `[width - strip_width, width)`. Both span the full height.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStrip`] unless
/// `2 * strip_width < width` (strips must not overlap or touch) and the
/// image has at least one row.
pub fn strip_window(
    bounds: Dimensions,
    strip_width: u32,
    side: StripSide,
) -> Result<CropWindow, PipelineError> {
    let fits = strip_width
        .checked_mul(2)
        .is_some_and(|both| both < bounds.width);
    if !fits || strip_width == 0 || bounds.height == 0 {
        return Err(PipelineError::DegenerateStrip(format!(
            "two {strip_width}px strips do not fit side by side in a {bounds} image"
        )));
    }

    let left = match side {
        StripSide::Left => 0,
        StripSide::Right => bounds.width - strip_width,
    };
    CropWindow::new(left, 0, left + strip_width, bounds.height).ok_or_else(|| {
        PipelineError::DegenerateStrip(format!("empty {side} strip in a {bounds} image"))
    })
}

/// Split an image into its left and right strips.
///
/// # Errors
///
/// See [`strip_window`].
pub fn extract_strips(
    image: &RgbImage,
    strip_width: u32,
) -> Result<(RgbImage, RgbImage), PipelineError> {
    let bounds = Dimensions::of(image);
    let left = strip_window(bounds, strip_width, StripSide::Left)?;
    let right = strip_window(bounds, strip_width, StripSide::Right)?;
    Ok((left.crop(image), right.crop(image)))
}
