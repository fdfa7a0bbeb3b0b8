//! Crop matching: pick the candidate that looks most like the reference.

use crate::descriptor::describe;
use crate::types::{Candidate, FeatureVector, MatchResult, PipelineError, RgbImage};

/// Pick the candidate whose features are closest to `reference`.
///
/// Distance is the L1 distance between feature vectors. The first
/// candidate wins ties, so the result is stable for a given candidate
/// order.
///
/// # Errors
///
/// Returns [`PipelineError::NoCandidates`] if `scored` is empty.
pub fn pick_best<I>(reference: &FeatureVector, scored: I) -> Result<MatchResult, PipelineError>
where
    I: IntoIterator<Item = (Candidate, FeatureVector)>,
{
    let mut best: Option<(Candidate, f64)> = None;
    let mut count = 0usize;

    for (candidate, features) in scored {
        count += 1;
        let distance = reference.l1_distance(&features);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(candidate, distance)| MatchResult {
        candidate,
        distance,
        candidates_scored: count,
    })
    .ok_or(PipelineError::NoCandidates)
}

/// Crop every candidate out of `strip`, describe it, and pick the one
/// closest to `reference`.
///
/// # Errors
///
/// Returns [`PipelineError::NoCandidates`] if `candidates` is empty.
/// Returns [`PipelineError::ShapeMismatch`] if a candidate window is not
/// square or does not fit the strip.
pub fn select_best(
    reference: &FeatureVector,
    strip: &RgbImage,
    candidates: &[Candidate],
) -> Result<MatchResult, PipelineError> {
    let scored = candidates
        .iter()
        .map(|candidate| Ok((*candidate, describe(&candidate.window.crop(strip))?)))
        .collect::<Result<Vec<_>, PipelineError>>()?;
    pick_best(reference, scored)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::candidates::staircase;
    use crate::types::{CropWindow, Dimensions, GRID_CELLS, StripSide};

    fn candidate(row: u32) -> Candidate {
        Candidate {
            side: StripSide::Left,
            row,
            window: CropWindow::new(0, row * 3, 3, row * 3 + 3).unwrap(),
        }
    }

    fn flat(value: f64) -> FeatureVector {
        FeatureVector::from_cells([[value; 3]; GRID_CELLS])
    }

    #[test]
    fn empty_is_no_candidates() {
        let result = pick_best(&flat(0.0), Vec::new());
        assert!(matches!(result, Err(PipelineError::NoCandidates)));
    }

    #[test]
    fn minimum_distance_wins() {
        let scored = vec![
            (candidate(0), flat(50.0)),
            (candidate(1), flat(12.0)),
            (candidate(2), flat(30.0)),
        ];
        let m = pick_best(&flat(10.0), scored).unwrap();
        assert_eq!(m.candidate.row, 1);
        // 27 components * |10 - 12|
        assert!((m.distance - 54.0).abs() < f64::EPSILON);
        assert_eq!(m.candidates_scored, 3);
    }

    #[test]
    fn first_seen_wins_ties() {
        let scored = vec![
            (candidate(0), flat(99.0)),
            (candidate(1), flat(20.0)),
            (candidate(2), flat(20.0)),
        ];
        let m = pick_best(&flat(20.0), scored).unwrap();
        assert_eq!(m.candidate.row, 1);
        assert!(m.distance.abs() < f64::EPSILON);
    }

    #[test]
    fn identical_crop_has_zero_distance_and_is_selected() {
        // Strip: three stacked 6x6 squares; only the middle one matches
        // the reference exactly.
        let reference_img = RgbImage::from_fn(6, 6, |x, y| image::Rgb([x as u8 * 40, y as u8 * 40, 9]));
        let strip = RgbImage::from_fn(6, 18, |x, y| {
            if (6..12).contains(&y) {
                *reference_img.get_pixel(x, y - 6)
            } else {
                image::Rgb([200, 10, 10])
            }
        });
        let reference = describe(&reference_img).unwrap();
        let candidates = staircase(&strip, Dimensions::square(6), 100, StripSide::Left).unwrap();
        assert_eq!(candidates.len(), 3);

        let m = select_best(&reference, &strip, &candidates).unwrap();
        assert_eq!(m.candidate.window.top(), 6);
        assert!(m.distance.abs() < f64::EPSILON);
    }

    #[test]
    fn select_best_with_no_candidates() {
        let strip = RgbImage::new(6, 6);
        let result = select_best(&flat(0.0), &strip, &[]);
        assert!(matches!(result, Err(PipelineError::NoCandidates)));
    }
}
