//! Staircase candidate generation.
//!
//! A side strip is much taller than one crop window. The strip is cut
//! into non-overlapping rows of `crop_height` pixels; each row yields a
//! left-aligned window and, when the strip is wider than a window, a
//! right-aligned one. If the rows leave a large enough band at the
//! bottom, one more bottom-aligned row is added so that band is not
//! lost. Small leftovers are skipped: the extra row would overlap the
//! last full row almost entirely.

use crate::types::{Candidate, CropWindow, Dimensions, PipelineError, RgbImage, StripSide};

/// Enumerate the staircase crop windows for a strip of size `bounds`.
///
/// Windows are emitted row by row, left-aligned before right-aligned.
/// The order matters only for tie-breaking in the matcher.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStrip`] if the strip is narrower
/// or shorter than one crop window. A strip shorter than the window
/// would otherwise place the remainder row above the top edge.
pub fn staircase_windows(
    bounds: Dimensions,
    crop_size: Dimensions,
    remainder_threshold: u32,
    side: StripSide,
) -> Result<Vec<Candidate>, PipelineError> {
    let Dimensions {
        width: cw,
        height: ch,
    } = crop_size;
    if crop_size.is_empty() {
        return Err(PipelineError::DegenerateStrip(format!(
            "empty crop size {crop_size}"
        )));
    }
    if bounds.width < cw {
        return Err(PipelineError::DegenerateStrip(format!(
            "{side} strip {bounds} is narrower than the {crop_size} crop window"
        )));
    }
    if bounds.height < ch {
        return Err(PipelineError::DegenerateStrip(format!(
            "{side} strip {bounds} is shorter than the {crop_size} crop window"
        )));
    }

    let full_rows = bounds.height / ch;
    let remainder = bounds.height % ch;
    let mut tops: Vec<u32> = (0..full_rows).map(|row| row * ch).collect();
    if remainder >= remainder_threshold && remainder > 0 {
        tops.push(bounds.height - ch);
    }

    let mut candidates = Vec::with_capacity(tops.len() * 2);
    for (row, top) in (0u32..).zip(tops) {
        candidates.extend(row_candidates(bounds, crop_size, side, row, top)?);
    }

    Ok(candidates)
}

/// The left-aligned and, when the strip is wider than a window,
/// right-aligned candidates of one staircase row.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStrip`] if a window would not lie
/// entirely inside `bounds`.
fn row_candidates(
    bounds: Dimensions,
    crop_size: Dimensions,
    side: StripSide,
    row: u32,
    top: u32,
) -> Result<Vec<Candidate>, PipelineError> {
    let mut lefts = vec![0];
    if bounds.width > crop_size.width {
        lefts.push(bounds.width - crop_size.width);
    }

    lefts
        .into_iter()
        .map(|left| {
            CropWindow::from_origin(left, top, crop_size)
                .filter(|w| w.fits_within(bounds))
                .map(|window| Candidate { side, row, window })
                .ok_or_else(|| {
                    PipelineError::DegenerateStrip(format!(
                        "{side} strip {bounds} cannot hold a {crop_size} window at ({left}, {top})"
                    ))
                })
        })
        .collect()
}

/// Enumerate the staircase crop windows for a strip image.
///
/// # Errors
///
/// See [`staircase_windows`].
pub fn staircase(
    strip: &RgbImage,
    crop_size: Dimensions,
    remainder_threshold: u32,
    side: StripSide,
) -> Result<Vec<Candidate>, PipelineError> {
    staircase_windows(
        Dimensions::of(strip),
        crop_size,
        remainder_threshold,
        side,
    )
}
