//! Input discovery and JPEG output.
//!
//! Each photograph `<stem>.<ext>` produces three files in the output
//! directory: `<stem>_c.jpg` (centered reference), `<stem>_l.jpg` and
//! `<stem>_r.jpg` (side crops).

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use metcrop_pipeline::{CropSet, RgbImage};
use serde::Serialize;
use tracing::warn;

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Which of the three output images a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Centered reference.
    Reference,
    /// Best crop from the left strip.
    Left,
    /// Best crop from the right strip.
    Right,
}

impl OutputKind {
    /// File-stem suffix for this output.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Reference => "_c",
            Self::Left => "_l",
            Self::Right => "_r",
        }
    }

    /// Output file name for a photograph stem.
    #[must_use]
    pub fn file_name(self, stem: &str) -> String {
        format!("{stem}{}.jpg", self.suffix())
    }
}

/// Paths of the three files written for one photograph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    /// `<stem>_c.jpg`
    pub reference: PathBuf,
    /// `<stem>_l.jpg`
    pub left: PathBuf,
    /// `<stem>_r.jpg`
    pub right: PathBuf,
}

impl OutputPaths {
    /// Output paths for photograph `stem` inside `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Path, stem: &str) -> Self {
        Self {
            reference: output_dir.join(OutputKind::Reference.file_name(stem)),
            left: output_dir.join(OutputKind::Left.file_name(stem)),
            right: output_dir.join(OutputKind::Right.file_name(stem)),
        }
    }

    /// The path for one output kind.
    #[must_use]
    pub fn get(&self, kind: OutputKind) -> &Path {
        match kind {
            OutputKind::Reference => &self.reference,
            OutputKind::Left => &self.left,
            OutputKind::Right => &self.right,
        }
    }
}

/// The file stem of a photograph path, if it has a UTF-8 one.
#[must_use]
pub fn photo_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str()).filter(|s| !s.is_empty())
}

/// Expand an input path into the photographs to process.
///
/// A file is returned as-is. A directory yields every regular file in it
/// that has an extension, sorted by path. Subdirectories are not walked.
///
/// # Errors
///
/// Returns any I/O error from reading the path or directory.
pub fn collect_inputs(input: &Path) -> io::Result<Vec<PathBuf>> {
    if !input.is_dir() {
        // Surface a missing path as an error here, not per photograph.
        std::fs::metadata(input)?;
        return Ok(vec![input.to_path_buf()]);
    }

    let mut photos = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some() {
            photos.push(path);
        }
    }
    photos.sort();
    Ok(photos)
}

/// Encode `image` as a JPEG at `path`.
///
/// # Errors
///
/// Returns [`image::ImageError::IoError`] if the file cannot be created,
/// or an encoding error from the JPEG encoder.
pub fn write_jpeg(path: &Path, image: &RgbImage, quality: u8) -> Result<(), image::ImageError> {
    let file = File::create(path)?;
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    image.write_with_encoder(encoder)
}

/// Write all three images of a [`CropSet`].
///
/// Either all three files are written or none are left behind: on
/// failure the files already written for this set are removed.
///
/// # Errors
///
/// Returns the first write error, together with the output kind that
/// failed.
pub fn write_crop_set(
    crops: &CropSet,
    paths: &OutputPaths,
    quality: u8,
) -> Result<(), (OutputKind, image::ImageError)> {
    write_all(
        [
            (OutputKind::Reference, &crops.reference),
            (OutputKind::Left, &crops.left.image),
            (OutputKind::Right, &crops.right.image),
        ],
        paths,
        quality,
    )
}

fn write_all(
    outputs: [(OutputKind, &RgbImage); 3],
    paths: &OutputPaths,
    quality: u8,
) -> Result<(), (OutputKind, image::ImageError)> {
    for (i, (kind, image)) in outputs.iter().enumerate() {
        if let Err(e) = write_jpeg(paths.get(*kind), image, quality) {
            for (written, _) in &outputs[..i] {
                let path = paths.get(*written);
                if let Err(rm) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %rm, "failed to remove partial output");
                }
            }
            return Err((*kind, e));
        }
    }
    Ok(())
}
