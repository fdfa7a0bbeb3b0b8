//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use metcrop_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # use rand::SeedableRng;
//! # fn run(jpeg: Vec<u8>) -> Result<(), PipelineError> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let crops = Pipeline::new(jpeg, PipelineConfig::default())
//!     .decode()?
//!     .strip_border()?
//!     .build_reference()?
//!     .extract_strips()?
//!     .match_crops()?
//!     .finish(&mut rng)
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages). Stages hand their rasters over by
//! move and keep only what later stages or the final [`CropSet`] need:
//! the stripped photograph is dropped once the strips are cut, and the
//! strips are dropped once their best crops are copied out.

use rand::Rng;

use crate::diagnostics::StageMetrics;
use crate::finish::{FinishedCrop, finish_crop};
use crate::types::{
    Dimensions, FeatureVector, MatchResult, PipelineConfig, PipelineError, RgbImage, StripSide,
};

/// Final output of the pipeline for one photograph.
#[derive(Debug, Clone)]
pub struct CropSet {
    /// Centered reference image (`_c`).
    pub reference: RgbImage,
    /// Best left crop after rotation (`_l`).
    pub left: FinishedCrop,
    /// Best right crop after rotation (`_r`).
    pub right: FinishedCrop,
    /// How the left crop was selected.
    pub left_match: MatchResult,
    /// How the right crop was selected.
    pub right_match: MatchResult,
    /// Size of the decoded photograph.
    pub source: Dimensions,
    /// Size after border stripping.
    pub stripped: Dimensions,
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing; call .decode() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source image bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Validate the config, decode the source image, and advance to the
    /// [`Decoded`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the config fails
    /// [`PipelineConfig::validate`]. Returns [`PipelineError::EmptyInput`]
    /// or [`PipelineError::ImageDecode`] if decoding fails.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        self.config.validate()?;
        let original = crate::decode::decode_rgb(&self.source)?;
        Ok(Decoded {
            config: self.config,
            original,
            source_len: self.source.len(),
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding the photograph to RGB.
#[must_use = "pipeline stages are consumed by advancing; call .strip_border() to continue"]
pub struct Decoded {
    config: PipelineConfig,
    original: RgbImage,
    source_len: usize,
}

impl Decoded {
    /// The decoded photograph.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// Remove the scale-bar border and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ImageTooSmall`] if nothing is left after
    /// stripping.
    pub fn strip_border(self) -> Result<BorderStripped, PipelineError> {
        let stripped =
            crate::border::strip_border(&self.original, self.config.border_percentage)?;
        Ok(BorderStripped {
            config: self.config,
            source: Dimensions::of(&self.original),
            stripped,
        })
    }
}

// ───────────────────────── Stage 2: BorderStripped ───────────────────

/// Pipeline state after the scale-bar border is removed.
#[must_use = "pipeline stages are consumed by advancing; call .build_reference() to continue"]
pub struct BorderStripped {
    config: PipelineConfig,
    source: Dimensions,
    stripped: RgbImage,
}

impl BorderStripped {
    /// The photograph without its border.
    #[must_use]
    pub const fn stripped(&self) -> &RgbImage {
        &self.stripped
    }

    /// Build the centered reference image and its features, and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ShapeMismatch`] if the reference cannot
    /// be described (only possible with an unvalidated config).
    pub fn build_reference(self) -> Result<ReferenceBuilt, PipelineError> {
        let reference = crate::reference::build_reference(
            &self.stripped,
            self.config.reference_size,
            self.config.reference_filter,
        )?;
        let features = crate::descriptor::describe(&reference)?;
        Ok(ReferenceBuilt {
            config: self.config,
            source: self.source,
            stripped: self.stripped,
            reference,
            features,
        })
    }
}

// ───────────────────────── Stage 3: ReferenceBuilt ───────────────────

/// Pipeline state after the reference image is built.
#[must_use = "pipeline stages are consumed by advancing; call .extract_strips() to continue"]
pub struct ReferenceBuilt {
    config: PipelineConfig,
    source: Dimensions,
    stripped: RgbImage,
    reference: RgbImage,
    features: FeatureVector,
}

impl ReferenceBuilt {
    /// The centered reference image.
    #[must_use]
    pub const fn reference(&self) -> &RgbImage {
        &self.reference
    }

    /// Feature vector every candidate is compared against.
    #[must_use]
    pub const fn features(&self) -> &FeatureVector {
        &self.features
    }

    /// Cut the left and right strips and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateStrip`] if the stripped
    /// photograph is not wider than two strips.
    pub fn extract_strips(self) -> Result<StripsExtracted, PipelineError> {
        let (left, right) = crate::strips::extract_strips(&self.stripped, self.config.strip_width)?;
        Ok(StripsExtracted {
            config: self.config,
            source: self.source,
            stripped: Dimensions::of(&self.stripped),
            reference: self.reference,
            features: self.features,
            left,
            right,
        })
    }
}

// ───────────────────────── Stage 4: StripsExtracted ──────────────────

/// Pipeline state after the side strips are cut.
#[must_use = "pipeline stages are consumed by advancing; call .match_crops() to continue"]
pub struct StripsExtracted {
    config: PipelineConfig,
    source: Dimensions,
    stripped: Dimensions,
    reference: RgbImage,
    features: FeatureVector,
    left: RgbImage,
    right: RgbImage,
}

impl StripsExtracted {
    /// The strip on the given side.
    #[must_use]
    pub const fn strip(&self, side: StripSide) -> &RgbImage {
        match side {
            StripSide::Left => &self.left,
            StripSide::Right => &self.right,
        }
    }

    /// Select the best crop from each strip and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateStrip`] if a strip cannot hold
    /// one crop window, or [`PipelineError::NoCandidates`] if it yields
    /// no candidates.
    pub fn match_crops(self) -> Result<Matched, PipelineError> {
        let (left_match, left_crop) = self.best_crop(StripSide::Left)?;
        let (right_match, right_crop) = self.best_crop(StripSide::Right)?;
        Ok(Matched {
            source: self.source,
            stripped: self.stripped,
            reference: self.reference,
            left_match,
            right_match,
            left_crop,
            right_crop,
        })
    }

    fn best_crop(&self, side: StripSide) -> Result<(MatchResult, RgbImage), PipelineError> {
        let strip = self.strip(side);
        let candidates = crate::candidates::staircase(
            strip,
            self.config.crop_size,
            self.config.remainder_threshold,
            side,
        )?;
        let best = crate::matcher::select_best(&self.features, strip, &candidates)?;
        let crop = best.candidate.window.crop(strip);
        Ok((best, crop))
    }
}

// ───────────────────────── Stage 5: Matched ──────────────────────────

/// Pipeline state after the best crop of each strip is selected.
#[must_use = "pipeline stages are consumed by advancing; call .finish() to continue"]
pub struct Matched {
    source: Dimensions,
    stripped: Dimensions,
    reference: RgbImage,
    left_match: MatchResult,
    right_match: MatchResult,
    left_crop: RgbImage,
    right_crop: RgbImage,
}

impl Matched {
    /// The selection for the given side.
    #[must_use]
    pub const fn selection(&self, side: StripSide) -> &MatchResult {
        match side {
            StripSide::Left => &self.left_match,
            StripSide::Right => &self.right_match,
        }
    }

    /// The unrotated best crop for the given side.
    #[must_use]
    pub const fn crop(&self, side: StripSide) -> &RgbImage {
        match side {
            StripSide::Left => &self.left_crop,
            StripSide::Right => &self.right_crop,
        }
    }

    /// Rotate both crops by independently drawn multiples of 90 degrees
    /// and advance to the final stage. The left rotation is drawn first.
    pub fn finish<R: Rng>(self, rng: &mut R) -> Finished {
        let left = finish_crop(self.left_crop, rng);
        let right = finish_crop(self.right_crop, rng);
        Finished {
            crops: CropSet {
                reference: self.reference,
                left,
                right,
                left_match: self.left_match,
                right_match: self.right_match,
                source: self.source,
                stripped: self.stripped,
            },
        }
    }
}

// ───────────────────────── Stage 6: Finished ─────────────────────────

/// Pipeline state after orientation normalization, the final stage.
#[must_use = "call .into_result() to extract the CropSet"]
pub struct Finished {
    crops: CropSet,
}

impl Finished {
    /// The finished crops.
    #[must_use]
    pub const fn crops(&self) -> &CropSet {
        &self.crops
    }

    /// Consume the pipeline and return the [`CropSet`].
    #[must_use]
    pub fn into_result(self) -> CropSet {
        self.crops
    }
}

// ──────────────────────── PipelineStage trait ─────────────────────────

/// Trait implemented by every pipeline stage that produced output,
/// giving diagnostics a uniform way to describe it.
pub trait PipelineStage {
    /// Human-readable stage name.
    const NAME: &str;

    /// Metrics describing this stage's output.
    fn metrics(&self) -> StageMetrics;
}

impl PipelineStage for Decoded {
    const NAME: &str = "Decode";

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Decode {
            input_bytes: self.source_len,
            width: self.original.width(),
            height: self.original.height(),
            pixel_count: u64::from(self.original.width()) * u64::from(self.original.height()),
        }
    }
}

impl PipelineStage for BorderStripped {
    const NAME: &str = "Border Strip";

    fn metrics(&self) -> StageMetrics {
        StageMetrics::BorderStrip {
            percentage: self.config.border_percentage,
            width: self.stripped.width(),
            height: self.stripped.height(),
        }
    }
}

impl PipelineStage for ReferenceBuilt {
    const NAME: &str = "Reference";

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Reference {
            source_side: self.stripped.width().min(self.stripped.height()),
            size: self.config.reference_size,
            filter: self.config.reference_filter.to_string(),
        }
    }
}

impl PipelineStage for StripsExtracted {
    const NAME: &str = "Strips";

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Strips {
            strip_width: self.config.strip_width,
            height: self.left.height(),
        }
    }
}

impl PipelineStage for Matched {
    const NAME: &str = "Match";

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Match {
            left: self.left_match.into(),
            right: self.right_match.into(),
        }
    }
}

impl PipelineStage for Finished {
    const NAME: &str = "Finish";

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Finish {
            left_degrees: self.crops.left.rotation.degrees(),
            right_degrees: self.crops.right.rotation.degrees(),
        }
    }
}

/// Entry point for the typestate pipeline.
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from source image bytes and config.
    ///
    /// No processing is performed. Call [`.decode()`](Pending::decode)
    /// to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image_bytes: Vec<u8>, config: PipelineConfig) -> Pending {
        Pending {
            config,
            source: image_bytes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::test_support::{encode_png, specimen_photo};

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            border_percentage: 0.1,
            reference_size: Dimensions::square(30),
            strip_width: 40,
            crop_size: Dimensions::square(30),
            remainder_threshold: 10,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn stages_expose_intermediates() {
        // 200x100 photo -> 160x80 after a 10% border.
        let png = encode_png(&specimen_photo(200, 100));
        let decoded = Pipeline::new(png, small_config()).decode().unwrap();
        assert_eq!(decoded.original().dimensions(), (200, 100));

        let stripped = decoded.strip_border().unwrap();
        assert_eq!(stripped.stripped().dimensions(), (160, 80));

        let reference = stripped.build_reference().unwrap();
        assert_eq!(reference.reference().dimensions(), (30, 30));

        let strips = reference.extract_strips().unwrap();
        assert_eq!(strips.strip(StripSide::Left).dimensions(), (40, 80));
        assert_eq!(strips.strip(StripSide::Right).dimensions(), (40, 80));

        let matched = strips.match_crops().unwrap();
        // 80 = 2 * 30 + 20, 20 >= 10: three rows of two windows.
        assert_eq!(matched.selection(StripSide::Left).candidates_scored, 6);
        assert_eq!(matched.crop(StripSide::Right).dimensions(), (30, 30));

        let crops = matched
            .finish(&mut StdRng::seed_from_u64(3))
            .into_result();
        assert_eq!(crops.reference.dimensions(), (30, 30));
        assert_eq!(crops.left.image.dimensions(), (30, 30));
        assert_eq!(crops.source, Dimensions::new(200, 100));
        assert_eq!(crops.stripped, Dimensions::new(160, 80));
    }

    #[test]
    fn invalid_config_is_rejected_before_decode() {
        let config = PipelineConfig {
            border_percentage: 0.6,
            ..small_config()
        };
        let result = Pipeline::new(Vec::new(), config).decode();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn narrow_photo_fails_at_strips() {
        let png = encode_png(&specimen_photo(90, 100));
        let result = Pipeline::new(png, small_config())
            .decode()
            .unwrap()
            .strip_border()
            .unwrap()
            .build_reference()
            .unwrap()
            .extract_strips();
        assert!(matches!(result, Err(PipelineError::DegenerateStrip(_))));
    }

    #[test]
    fn short_photo_fails_at_match() {
        // 300x30 -> 240x24 after border; strips are 24 rows, crop is 30.
        let png = encode_png(&specimen_photo(300, 30));
        let result = Pipeline::new(png, small_config())
            .decode()
            .unwrap()
            .strip_border()
            .unwrap()
            .build_reference()
            .unwrap()
            .extract_strips()
            .unwrap()
            .match_crops();
        assert!(matches!(result, Err(PipelineError::DegenerateStrip(_))));
    }

    #[test]
    fn stage_metrics_names() {
        assert_eq!(Decoded::NAME, "Decode");
        assert_eq!(Finished::NAME, "Finish");
    }
}
