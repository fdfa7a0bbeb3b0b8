//! metcrop-pipeline: crop selection for meteorite specimen photographs
//! (sans-IO).
//!
//! Each photograph shows the specimen in the middle and alternate views
//! of it in vertical strips along the left and right edges. The pipeline
//! produces three square images per photograph:
//!
//! decode -> strip border -> centered reference -> side strips ->
//! staircase candidates -> nearest-descriptor match -> random rotation.
//!
//! This crate has **no I/O dependencies**: it takes encoded image bytes
//! and returns in-memory rasters. Reading directories, writing JPEGs and
//! worker pools live in `metcrop-io`.

pub mod border;
pub mod candidates;
pub mod decode;
pub mod descriptor;
pub mod diagnostics;
pub mod finish;
pub mod matcher;
pub mod pipeline;
pub mod reference;
pub mod strips;
pub mod types;

#[cfg(test)]
mod test_support;

use rand::Rng;

pub use diagnostics::{Clock, PipelineDiagnostics, process_with_diagnostics};
pub use finish::{FinishedCrop, Rotation};
pub use pipeline::{CropSet, Pipeline, PipelineStage};
pub use reference::ResampleFilter;
pub use types::{
    Candidate, CropWindow, Dimensions, FeatureVector, MatchResult, PipelineConfig, PipelineError,
    RgbImage, StripSide,
};

/// Run the full crop-selection pipeline on one photograph.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP), a configuration and a
/// random source for the crop rotations, and produces the centered
/// reference plus the best left and right crops.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if the bytes are not a supported image.
/// Returns [`PipelineError::ImageTooSmall`] or
/// [`PipelineError::DegenerateStrip`] if the photograph is too small for
/// the configured geometry.
pub fn process<R: Rng>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<CropSet, PipelineError> {
    Ok(Pipeline::new(image_bytes.to_vec(), config.clone())
        .decode()?
        .strip_border()?
        .build_reference()?
        .extract_strips()?
        .match_crops()?
        .finish(rng)
        .into_result())
}
