//! Batch processing: run the pipeline over many photographs on a
//! bounded worker pool.
//!
//! Every photograph is independent. A task owns its decoded images and
//! its own random source, and a failure is recorded in the
//! [`BatchReport`] without cancelling any sibling task.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use metcrop_pipeline::{Clock, PipelineConfig, PipelineDiagnostics, PipelineError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::output::{DEFAULT_JPEG_QUALITY, OutputPaths, photo_stem, write_crop_set};

/// Worker count used when none is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Wall-clock [`Clock`] backed by [`std::time::Instant`].
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Errors that end processing of one photograph.
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    /// The photograph could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file name has no usable stem to derive output names from.
    #[error("cannot derive output names from {}", path.display())]
    NoStem { path: PathBuf },

    /// The pipeline rejected the photograph.
    #[error("{}: {source}", path.display())]
    Pipeline {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },

    /// An output image could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Errors that prevent a batch from starting.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The pipeline configuration is invalid.
    #[error(transparent)]
    Config(#[from] PipelineError),

    /// The batch options are invalid.
    #[error("invalid batch options: {0}")]
    Options(String),

    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Batch-level settings that do not affect crop selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Number of worker threads.
    pub workers: usize,
    /// Base seed for the rotation RNG. Photograph `i` of the batch uses
    /// `seed + i`. `None` seeds each photograph from OS entropy.
    pub seed: Option<u64>,
    /// JPEG quality for all outputs, `1..=100`.
    pub jpeg_quality: u8,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            seed: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl BatchOptions {
    /// Check that the options can drive a batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Options`] for zero workers or a JPEG quality
    /// outside `1..=100`.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.workers == 0 {
            return Err(BatchError::Options("worker count must be at least 1".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(BatchError::Options(format!(
                "JPEG quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Random source for the photograph at `index` in the batch.
    #[must_use]
    pub fn rng_for(&self, index: usize) -> StdRng {
        self.seed.map_or_else(StdRng::from_entropy, |seed| {
            StdRng::seed_from_u64(seed.wrapping_add(index as u64))
        })
    }
}

/// A photograph that was processed successfully.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedPhoto {
    /// The three files written.
    pub outputs: OutputPaths,
    /// Per-stage timing and metrics.
    pub diagnostics: PipelineDiagnostics,
}

/// Process one photograph and write its three outputs.
///
/// `output_dir` must already exist.
///
/// # Errors
///
/// Returns a [`PhotoError`] naming the photograph if reading, any
/// pipeline stage, or writing fails.
#[instrument(skip_all, fields(photo = %input.display()))]
pub fn process_photo(
    input: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
    jpeg_quality: u8,
    rng: &mut StdRng,
) -> Result<ProcessedPhoto, PhotoError> {
    let stem = photo_stem(input).ok_or_else(|| PhotoError::NoStem {
        path: input.to_path_buf(),
    })?;
    let bytes = std::fs::read(input).map_err(|source| PhotoError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let (crops, diagnostics) =
        metcrop_pipeline::process_with_diagnostics(&bytes, config, rng, &StdClock).map_err(
            |source| PhotoError::Pipeline {
                path: input.to_path_buf(),
                source,
            },
        )?;
    debug!(
        left = %crops.left_match.candidate.window,
        right = %crops.right_match.candidate.window,
        left_rotation = %crops.left.rotation,
        right_rotation = %crops.right.rotation,
        "crops selected"
    );
    debug!("\n{}", diagnostics.report());

    let outputs = OutputPaths::new(output_dir, stem);
    write_crop_set(&crops, &outputs, jpeg_quality).map_err(|(kind, source)| {
        PhotoError::Write {
            path: outputs.get(kind).to_path_buf(),
            source,
        }
    })?;

    Ok(ProcessedPhoto {
        outputs,
        diagnostics,
    })
}

/// What happened to one photograph of a batch.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhotoStatus {
    /// All three outputs were written.
    Done(ProcessedPhoto),
    /// Processing stopped with an error.
    Failed {
        /// Display form of the [`PhotoError`].
        error: String,
    },
}

/// Outcome for one input path.
#[derive(Debug, Serialize)]
pub struct PhotoOutcome {
    /// The photograph.
    pub input: PathBuf,
    /// What happened to it.
    #[serde(flatten)]
    pub status: PhotoStatus,
}

/// Result of a whole batch, in input order.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// One entry per input, in the order given.
    pub photos: Vec<PhotoOutcome>,
    /// Number of photographs fully written.
    pub succeeded: usize,
    /// Number of photographs that failed.
    pub failed: usize,
    /// Wall-clock duration of the batch (seconds).
    pub elapsed_secs: f64,
}

impl BatchReport {
    /// Whether every photograph succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Process `inputs` in parallel, writing outputs into `output_dir`.
///
/// The output directory is created if missing. Per-photograph failures
/// are logged and recorded in the report; they never abort the batch.
///
/// # Errors
///
/// Returns a [`BatchError`] only if the batch cannot start: invalid
/// config or options, an uncreatable output directory, or a worker pool
/// that fails to spawn.
pub fn process_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &PipelineConfig,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    options.validate()?;
    std::fs::create_dir_all(output_dir).map_err(|source| BatchError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("metcrop-worker-{i}"))
        .build()?;

    info!(
        photos = inputs.len(),
        workers = options.workers,
        output = %output_dir.display(),
        "batch started"
    );
    let start = Instant::now();

    let photos: Vec<PhotoOutcome> = pool.install(|| {
        inputs
            .par_iter()
            .enumerate()
            .map(|(index, input)| {
                let mut rng = options.rng_for(index);
                let status =
                    match process_photo(input, output_dir, config, options.jpeg_quality, &mut rng)
                    {
                        Ok(done) => PhotoStatus::Done(done),
                        Err(e) => {
                            warn!(photo = %input.display(), error = %e, "photo failed");
                            PhotoStatus::Failed {
                                error: e.to_string(),
                            }
                        }
                    };
                PhotoOutcome {
                    input: input.clone(),
                    status,
                }
            })
            .collect()
    });

    let failed = photos
        .iter()
        .filter(|p| matches!(p.status, PhotoStatus::Failed { .. }))
        .count();
    let report = BatchReport {
        succeeded: photos.len() - failed,
        failed,
        photos,
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        elapsed_secs = report.elapsed_secs,
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn default_options() {
        let opts = BatchOptions::default();
        assert_eq!(opts.workers, 4);
        assert_eq!(opts.jpeg_quality, 75);
        assert!(opts.seed.is_none());
        opts.validate().unwrap();
    }

    #[test]
    fn zero_workers_rejected() {
        let opts = BatchOptions {
            workers: 0,
            ..BatchOptions::default()
        };
        assert!(matches!(opts.validate(), Err(BatchError::Options(_))));
    }

    #[test]
    fn quality_out_of_range_rejected() {
        let opts = BatchOptions {
            jpeg_quality: 0,
            ..BatchOptions::default()
        };
        assert!(matches!(opts.validate(), Err(BatchError::Options(_))));
    }

    #[test]
    fn seeded_rng_differs_per_photo_and_repeats_per_run() {
        let opts = BatchOptions {
            seed: Some(10),
            ..BatchOptions::default()
        };
        let draw = |i| opts.rng_for(i).r#gen::<u64>();
        assert_eq!(draw(0), draw(0));
        assert_ne!(draw(0), draw(1));
        assert_eq!(draw(1), StdRng::seed_from_u64(11).r#gen::<u64>());
    }

    #[test]
    fn invalid_config_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            strip_width: 0,
            ..PipelineConfig::default()
        };
        let result = process_batch(&[], dir.path(), &config, &BatchOptions::default());
        assert!(matches!(result, Err(BatchError::Config(_))));
    }

    #[test]
    fn missing_photo_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = process_photo(
            &dir.path().join("gone.jpg"),
            dir.path(),
            &PipelineConfig::default(),
            75,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, PhotoError::Read { .. }));
        assert!(err.to_string().contains("gone.jpg"));
    }
}
