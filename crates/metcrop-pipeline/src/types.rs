//! Shared types for the metcrop crop-selection pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reference::ResampleFilter;

/// Re-export `RgbImage` so downstream crates can hold pipeline rasters
/// without depending on `image` directly.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new pair of dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A square of side `side`.
    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Dimensions of an image.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Returns `true` if width equals height.
    #[must_use]
    pub const fn is_square(self) -> bool {
        self.width == self.height
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which side strip of the photograph a crop comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StripSide {
    /// The strip along the left edge.
    Left,
    /// The strip along the right edge.
    Right,
}

impl fmt::Display for StripSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// An axis-aligned rectangle in pixel coordinates of some source image.
///
/// `right` and `bottom` are exclusive. Construction guarantees
/// `left < right` and `top < bottom`; whether the window fits a given
/// image is checked with [`fits_within`](Self::fits_within).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl CropWindow {
    /// Create a window, or `None` if it would be empty.
    #[must_use]
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Option<Self> {
        if left < right && top < bottom {
            Some(Self {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Create a window from its top-left corner and size, or `None` if
    /// the size is zero or the far edge overflows `u32`.
    #[must_use]
    pub fn from_origin(left: u32, top: u32, size: Dimensions) -> Option<Self> {
        let right = left.checked_add(size.width)?;
        let bottom = top.checked_add(size.height)?;
        Self::new(left, top, right, bottom)
    }

    /// Left edge (inclusive).
    #[must_use]
    pub const fn left(&self) -> u32 {
        self.left
    }

    /// Top edge (inclusive).
    #[must_use]
    pub const fn top(&self) -> u32 {
        self.top
    }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.right
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.bottom
    }

    /// Window width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Window height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Window size.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// Returns `true` if the window lies entirely inside an image of
    /// the given size.
    #[must_use]
    pub const fn fits_within(&self, bounds: Dimensions) -> bool {
        self.right <= bounds.width && self.bottom <= bounds.height
    }

    /// Copy the pixels under this window into a new image.
    ///
    /// Windows reaching past the image edge are clamped by
    /// [`image::imageops::crop_imm`]; callers that need the exact size
    /// check [`fits_within`](Self::fits_within) first.
    #[must_use = "returns the cropped image"]
    pub fn crop(&self, image: &RgbImage) -> RgbImage {
        image::imageops::crop_imm(image, self.left, self.top, self.width(), self.height())
            .to_image()
    }
}

impl fmt::Display for CropWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// A crop window tagged with the strip it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Strip the window belongs to.
    pub side: StripSide,
    /// Staircase row the window was emitted for. The remainder row, when
    /// present, takes the index after the last full row.
    pub row: u32,
    /// Window in strip coordinates.
    pub window: CropWindow,
}

/// Number of cells per grid axis in a [`FeatureVector`].
pub const GRID_SIZE: u32 = 3;

/// Number of cells in a [`FeatureVector`].
pub const GRID_CELLS: usize = (GRID_SIZE * GRID_SIZE) as usize;

/// Coarse color layout of a square image: mean R, G, B for each cell of
/// a 3x3 grid.
///
/// Cells are stored column-major: index `col * 3 + row`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([[f64; 3]; GRID_CELLS]);

impl FeatureVector {
    /// Wrap precomputed cell means.
    #[must_use]
    pub const fn from_cells(cells: [[f64; 3]; GRID_CELLS]) -> Self {
        Self(cells)
    }

    /// Per-cell `[r, g, b]` means, column-major.
    #[must_use]
    pub const fn cells(&self) -> &[[f64; 3]; GRID_CELLS] {
        &self.0
    }

    /// Sum of absolute differences over all 27 components.
    #[must_use]
    pub fn l1_distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).abs()))
            .sum()
    }
}

/// The crop selected for one strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The winning candidate.
    pub candidate: Candidate,
    /// L1 distance between the candidate's features and the reference's.
    pub distance: f64,
    /// How many candidates were scored to pick this one.
    pub candidates_scored: usize,
}

/// Configuration for the crop-selection pipeline.
///
/// Every field has a default matching the photographs the pipeline was
/// tuned on. [`validate`](Self::validate) checks the invariants the
/// stages rely on; [`crate::process`] calls it before touching pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of width and height removed from every edge to drop the
    /// printed scale bar. Must lie in `[0.0, 0.5)`.
    pub border_percentage: f64,

    /// Size of the centered reference image. Must be square.
    pub reference_size: Dimensions,

    /// Resampling filter used to scale the reference square.
    pub reference_filter: ResampleFilter,

    /// Width in pixels of each side strip.
    pub strip_width: u32,

    /// Size of every candidate crop window. Must be square.
    pub crop_size: Dimensions,

    /// Minimum leftover strip height (pixels) that earns an extra
    /// bottom-aligned row of candidates.
    pub remainder_threshold: u32,
}

impl PipelineConfig {
    /// Default border strip fraction.
    pub const DEFAULT_BORDER_PERCENTAGE: f64 = 0.075;
    /// Default reference image side.
    pub const DEFAULT_REFERENCE_SIZE: u32 = 400;
    /// Default reference resampling filter.
    pub const DEFAULT_REFERENCE_FILTER: ResampleFilter = ResampleFilter::Lanczos3;
    /// Default side strip width.
    pub const DEFAULT_STRIP_WIDTH: u32 = 800;
    /// Default candidate crop side.
    pub const DEFAULT_CROP_SIZE: u32 = 400;
    /// Default staircase remainder threshold.
    pub const DEFAULT_REMAINDER_THRESHOLD: u32 = 100;

    /// Check the invariants every stage relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..0.5).contains(&self.border_percentage) {
            return Err(PipelineError::InvalidConfig(format!(
                "border_percentage must be in [0.0, 0.5), got {}",
                self.border_percentage
            )));
        }
        if self.reference_size.is_empty() || !self.reference_size.is_square() {
            return Err(PipelineError::InvalidConfig(format!(
                "reference_size must be a non-empty square, got {}",
                self.reference_size
            )));
        }
        if self.crop_size.is_empty() || !self.crop_size.is_square() {
            return Err(PipelineError::InvalidConfig(format!(
                "crop_size must be a non-empty square, got {}",
                self.crop_size
            )));
        }
        if self.strip_width == 0 {
            return Err(PipelineError::InvalidConfig(
                "strip_width must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            border_percentage: Self::DEFAULT_BORDER_PERCENTAGE,
            reference_size: Dimensions::square(Self::DEFAULT_REFERENCE_SIZE),
            reference_filter: Self::DEFAULT_REFERENCE_FILTER,
            strip_width: Self::DEFAULT_STRIP_WIDTH,
            crop_size: Dimensions::square(Self::DEFAULT_CROP_SIZE),
            remainder_threshold: Self::DEFAULT_REMAINDER_THRESHOLD,
        }
    }
}

/// Errors that can occur while processing one photograph.
///
/// Every variant is local to the photograph being processed; batch
/// callers record it and move on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// Stripping the border left nothing of the image.
    #[error("image {0} is too small to strip its border")]
    ImageTooSmall(Dimensions),

    /// Feature extraction was given an image it cannot describe.
    #[error("feature extraction needs a square image of side >= 3, got {0}")]
    ShapeMismatch(Dimensions),

    /// A strip cannot hold a single crop window.
    #[error("degenerate strip: {0}")]
    DegenerateStrip(String),

    /// The candidate generator produced nothing to match against.
    #[error("no crop candidates to match against")]
    NoCandidates,
}
