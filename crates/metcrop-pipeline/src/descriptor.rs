//! Grid-average feature descriptor.
//!
//! Summarizes a square image as the mean color of each cell of a 3x3
//! grid. Two crops showing the same specimen from similar angles have
//! similar coarse color layouts, which is all the crop matcher needs.
//!
//! # Trailing pixels
//!
//! The grid step is `side / 3` (integer division), so the grid covers
//! `3 * (side / 3)` pixels per axis. When `side` is not a multiple of 3
//! the last one or two rows and columns are ignored. This is part of the
//! descriptor's definition: changing it would change which crop wins.

use imageproc::integral_image::{integral_image, sum_image_pixels};

use crate::types::{Dimensions, FeatureVector, GRID_CELLS, GRID_SIZE, PipelineError, RgbImage};

/// Compute the 3x3 grid-average descriptor of a square image.
///
/// Cells are ordered column-major (`col * 3 + row`). Means are exact
/// integer channel sums divided by the cell area, so the result is
/// bit-identical across calls.
///
/// # Errors
///
/// Returns [`PipelineError::ShapeMismatch`] if the image is not square
/// or is smaller than the grid.
#[allow(clippy::cast_precision_loss)]
pub fn describe(image: &RgbImage) -> Result<FeatureVector, PipelineError> {
    let dims = Dimensions::of(image);
    if !dims.is_square() || dims.width < GRID_SIZE {
        return Err(PipelineError::ShapeMismatch(dims));
    }

    let step = dims.width / GRID_SIZE;
    let area = f64::from(step) * f64::from(step);
    let integral = integral_image::<_, u64>(image);

    let mut cells = [[0.0; 3]; GRID_CELLS];
    for col in 0..GRID_SIZE {
        for row in 0..GRID_SIZE {
            let left = col * step;
            let top = row * step;
            // Bounds are inclusive.
            let sums = sum_image_pixels(&integral, left, top, left + step - 1, top + step - 1);
            cells[(col * GRID_SIZE + row) as usize] = [
                sums[0] as f64 / area,
                sums[1] as f64 / area,
                sums[2] as f64 / area,
            ];
        }
    }

    Ok(FeatureVector::from_cells(cells))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// 9x9 image where every 3x3 block is a flat color encoding its
    /// block coordinates.
    fn block_image() -> RgbImage {
        RgbImage::from_fn(9, 9, |x, y| {
            let (col, row) = (x / 3, y / 3);
            image::Rgb([(col * 10) as u8, (row * 10) as u8, 7])
        })
    }

    #[test]
    fn side_nine_cells_are_exact_blocks() {
        let fv = describe(&block_image()).unwrap();
        for col in 0..3u32 {
            for row in 0..3u32 {
                let cell = fv.cells()[(col * 3 + row) as usize];
                assert_eq!(
                    cell,
                    [f64::from(col * 10), f64::from(row * 10), 7.0],
                    "cell ({col}, {row})"
                );
            }
        }
    }

    #[test]
    fn cells_are_column_major() {
        // Only the top-right block is bright: col 2, row 0 -> index 6.
        let img = RgbImage::from_fn(9, 9, |x, y| {
            if x >= 6 && y < 3 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let fv = describe(&img).unwrap();
        assert_eq!(fv.cells()[6], [255.0, 255.0, 255.0]);
        assert_eq!(fv.cells()[2], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn mean_within_cell() {
        // Side 6, step 2: every cell holds one black column and one
        // colored column.
        let img = RgbImage::from_fn(6, 6, |x, _| {
            if x % 2 == 0 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([100, 50, 25])
            }
        });
        let fv = describe(&img).unwrap();
        for cell in fv.cells() {
            assert_eq!(*cell, [50.0, 25.0, 12.5]);
        }
    }

    #[test]
    fn trailing_pixels_are_ignored() {
        // Side 10: step 3, grid covers 9 pixels. Paint the 10th row and
        // column white; the descriptor must equal that of the 9x9 core.
        let core = block_image();
        let padded = RgbImage::from_fn(10, 10, |x, y| {
            if x == 9 || y == 9 {
                image::Rgb([255, 255, 255])
            } else {
                *core.get_pixel(x, y)
            }
        });
        assert_eq!(describe(&padded).unwrap(), describe(&core).unwrap());
    }

    #[test]
    fn descriptor_is_deterministic() {
        let img = RgbImage::from_fn(31, 31, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        let a = describe(&img).unwrap();
        let b = describe(&img).unwrap();
        assert_eq!(a, b);
        assert!(a.l1_distance(&b).abs() < f64::EPSILON);
    }

    #[test]
    fn non_square_is_shape_mismatch() {
        let img = RgbImage::new(9, 10);
        assert!(matches!(
            describe(&img),
            Err(PipelineError::ShapeMismatch(d)) if d == Dimensions::new(9, 10)
        ));
    }

    #[test]
    fn smaller_than_grid_is_shape_mismatch() {
        let img = RgbImage::new(2, 2);
        assert!(matches!(
            describe(&img),
            Err(PipelineError::ShapeMismatch(_))
        ));
    }
}
