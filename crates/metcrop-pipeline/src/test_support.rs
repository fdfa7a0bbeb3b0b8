//! Shared fixtures for unit tests.

use std::io::Cursor;

use image::{ImageFormat, Rgb};

use crate::types::RgbImage;

/// Encode an image as PNG bytes.
#[allow(clippy::unwrap_used)]
pub fn encode_png(image: &RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Synthetic specimen photograph: a dark blob in the middle of a light
/// gradient, with a smaller copy of the blob in each side band.
#[allow(clippy::cast_possible_truncation)]
pub fn specimen_photo(width: u32, height: u32) -> RgbImage {
    let (cx, cy) = (width / 2, height / 2);
    let radius = width.min(height) / 4;
    let side = width / 6;
    let inside = |x: u32, y: u32, ox: u32, oy: u32, r: u32| {
        let dx = i64::from(x) - i64::from(ox);
        let dy = i64::from(y) - i64::from(oy);
        dx * dx + dy * dy <= i64::from(r) * i64::from(r)
    };
    RgbImage::from_fn(width, height, |x, y| {
        let r2 = radius / 2;
        if inside(x, y, cx, cy, radius)
            || inside(x, y, side, cy, r2)
            || inside(x, y, width - side, cy, r2)
        {
            Rgb([60, 45, 40])
        } else {
            let g = 160 + (x * 80 / width.max(1)) as u8;
            Rgb([g, g, 180 + (y * 60 / height.max(1)) as u8])
        }
    })
}
