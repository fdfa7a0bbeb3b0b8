//! Orientation normalization for the selected side crops.
//!
//! Side views have no canonical "up", so each selected crop is turned by
//! a random multiple of 90 degrees. The random source is a parameter:
//! callers that need reproducible output pass a seeded generator.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::RgbImage;

/// A counter-clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90 degrees counter-clockwise.
    Quarter,
    /// 180 degrees.
    Half,
    /// 270 degrees counter-clockwise.
    ThreeQuarter,
}

impl Rotation {
    /// All rotations, in increasing angle.
    pub const ALL: [Self; 4] = [Self::None, Self::Quarter, Self::Half, Self::ThreeQuarter];

    /// Draw one rotation uniformly from [`ALL`](Self::ALL).
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Counter-clockwise angle in degrees.
    #[must_use]
    pub const fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }

    /// Rotate an image. [`Rotation::None`] returns an unchanged copy.
    ///
    /// `image::imageops` rotates clockwise, so a quarter turn
    /// counter-clockwise is `rotate270`.
    #[must_use = "returns the rotated image"]
    pub fn apply(self, image: &RgbImage) -> RgbImage {
        match self {
            Self::None => image.clone(),
            Self::Quarter => image::imageops::rotate270(image),
            Self::Half => image::imageops::rotate180(image),
            Self::ThreeQuarter => image::imageops::rotate90(image),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A side crop after orientation normalization.
#[derive(Debug, Clone)]
pub struct FinishedCrop {
    /// The rotated crop.
    pub image: RgbImage,
    /// The rotation that was applied.
    pub rotation: Rotation,
}

/// Draw a rotation and apply it to `crop`.
#[must_use]
pub fn finish_crop<R: Rng>(crop: RgbImage, rng: &mut R) -> FinishedCrop {
    let rotation = Rotation::random(rng);
    let image = match rotation {
        Rotation::None => crop,
        turn => turn.apply(&crop),
    };
    FinishedCrop { image, rotation }
}
