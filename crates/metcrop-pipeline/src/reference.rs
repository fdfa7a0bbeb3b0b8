//! Reference image: the centered canonical square.
//!
//! The specimen's main view sits in the middle of the photograph. The
//! largest centered square is cut out and resampled to a fixed analysis
//! size; every candidate crop from the side strips is compared against
//! this image.

use std::fmt;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::types::{CropWindow, Dimensions, PipelineError, RgbImage};

/// Resampling filter used when scaling the reference square.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, anti-aliased, best for photos.
    #[default]
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// The largest square centered in an image of the given size.
///
/// For side `s = min(w, h)` the square starts at `((w - s) / 2, (h - s) / 2)`
/// with integer division, so odd leftovers favor the top-left: the
/// extra pixel row or column always stays on the bottom or right.
/// Half-to-even rounding of the offset would shift the square by one
/// pixel for some sizes. Returns `None` for an empty image.
#[must_use]
pub const fn center_square_window(bounds: Dimensions) -> Option<CropWindow> {
    let side = if bounds.width < bounds.height {
        bounds.width
    } else {
        bounds.height
    };
    let left = (bounds.width - side) / 2;
    let top = (bounds.height - side) / 2;
    CropWindow::new(left, top, left + side, top + side)
}

/// Crop the centered square and resample it to exactly `size`.
///
/// # Errors
///
/// Returns [`PipelineError::ImageTooSmall`] if `image` is empty.
pub fn build_reference(
    image: &RgbImage,
    size: Dimensions,
    filter: ResampleFilter,
) -> Result<RgbImage, PipelineError> {
    let bounds = Dimensions::of(image);
    let window = center_square_window(bounds).ok_or(PipelineError::ImageTooSmall(bounds))?;
    let square = window.crop(image);
    Ok(image::imageops::resize(
        &square,
        size.width,
        size.height,
        filter.to_image_filter(),
    ))
}
