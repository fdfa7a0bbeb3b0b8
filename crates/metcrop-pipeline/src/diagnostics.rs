//! Pipeline diagnostics: timing and metrics for each stage.
//!
//! [`process_with_diagnostics`] drives the typestate pipeline one stage
//! at a time, timing each step with a caller-supplied [`Clock`] so this
//! crate stays free of platform time sources.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pipeline::{CropSet, Pipeline, PipelineStage};
use crate::types::{Dimensions, MatchResult, PipelineConfig, PipelineError, StripSide};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Per-stage diagnostics, in execution order.
    pub stages: Vec<StageDiagnostics>,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the run.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Stage name.
    pub name: String,
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Compact description of one strip's selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Strip side.
    pub side: StripSide,
    /// Number of candidates scored.
    pub candidate_count: usize,
    /// Staircase row of the winner.
    pub best_row: u32,
    /// Left edge of the winner in strip coordinates.
    pub best_left: u32,
    /// Top edge of the winner in strip coordinates.
    pub best_top: u32,
    /// L1 distance of the winner to the reference.
    pub distance: f64,
}

impl From<MatchResult> for MatchMetrics {
    fn from(m: MatchResult) -> Self {
        Self {
            side: m.candidate.side,
            candidate_count: m.candidates_scored,
            best_row: m.candidate.row,
            best_left: m.candidate.window.left(),
            best_top: m.candidate.window.top(),
            distance: m.distance,
        }
    }
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Border stripping metrics.
    BorderStrip {
        /// Fraction removed from each edge.
        percentage: f64,
        /// Width after stripping.
        width: u32,
        /// Height after stripping.
        height: u32,
    },
    /// Reference builder metrics.
    Reference {
        /// Side of the centered square before resampling.
        source_side: u32,
        /// Output size.
        size: Dimensions,
        /// Resampling filter name.
        filter: String,
    },
    /// Strip extraction metrics.
    Strips {
        /// Width of each strip.
        strip_width: u32,
        /// Height of each strip.
        height: u32,
    },
    /// Crop matching metrics for both strips.
    Match {
        /// Left strip selection.
        left: MatchMetrics,
        /// Right strip selection.
        right: MatchMetrics,
    },
    /// Rotation metrics.
    Finish {
        /// Counter-clockwise rotation applied to the left crop.
        left_degrees: u32,
        /// Counter-clockwise rotation applied to the right crop.
        right_degrees: u32,
    },
}

/// High-level summary of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Decoded photograph size.
    pub source: Dimensions,
    /// Size after border stripping.
    pub stripped: Dimensions,
    /// L1 distance of the selected left crop.
    pub left_distance: f64,
    /// L1 distance of the selected right crop.
    pub right_distance: f64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {} -> {} after border strip",
            self.summary.source, self.summary.stripped,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for stage in &self.stages {
            let ms = duration_ms(stage.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&stage.metrics);
            lines.push(format!("{:<16} {ms:>8.3}ms {pct:>9.1}%  {details}", stage.name));
        }

        lines.push(String::new());
        lines.push(format!(
            "Distances: left={:.2}  |  right={:.2}",
            self.summary.left_distance, self.summary.right_distance,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_match(m: &MatchMetrics) -> String {
    format!(
        "{} row {} @({}, {}) d={:.2} of {}",
        m.side, m.best_row, m.best_left, m.best_top, m.distance, m.candidate_count,
    )
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::BorderStrip {
            percentage,
            width,
            height,
        } => format!("p={percentage:.3} -> {width}x{height}"),
        StageMetrics::Reference {
            source_side,
            size,
            filter,
        } => format!("{source_side}px square -> {size} ({filter})"),
        StageMetrics::Strips {
            strip_width,
            height,
        } => format!("2 x {strip_width}x{height}"),
        StageMetrics::Match { left, right } => {
            format!("{}; {}", format_match(left), format_match(right))
        }
        StageMetrics::Finish {
            left_degrees,
            right_degrees,
        } => format!("left={left_degrees}° right={right_degrees}°"),
    }
}

/// Time one stage transition and record its diagnostics.
fn timed<C, S, F>(
    clock: &C,
    stages: &mut Vec<StageDiagnostics>,
    advance: F,
) -> Result<S, PipelineError>
where
    C: Clock,
    S: PipelineStage,
    F: FnOnce() -> Result<S, PipelineError>,
{
    let start = clock.now();
    let stage = advance()?;
    stages.push(StageDiagnostics {
        name: S::NAME.to_owned(),
        duration: clock.elapsed(&start),
        metrics: stage.metrics(),
    });
    Ok(stage)
}

/// Run the full pipeline, collecting per-stage diagnostics.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub fn process_with_diagnostics<C: Clock, R: Rng>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    rng: &mut R,
    clock: &C,
) -> Result<(CropSet, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();
    let mut stages = Vec::with_capacity(6);

    let pending = Pipeline::new(image_bytes.to_vec(), config.clone());
    let decoded = timed(clock, &mut stages, || pending.decode())?;
    let stripped = timed(clock, &mut stages, || decoded.strip_border())?;
    let reference = timed(clock, &mut stages, || stripped.build_reference())?;
    let strips = timed(clock, &mut stages, || reference.extract_strips())?;
    let matched = timed(clock, &mut stages, || strips.match_crops())?;
    let finished = timed(clock, &mut stages, || Ok(matched.finish(rng)))?;

    let crops = finished.into_result();
    let diagnostics = PipelineDiagnostics {
        stages,
        total_duration: clock.elapsed(&total_start),
        summary: PipelineSummary {
            source: crops.source,
            stripped: crops.stripped,
            left_distance: crops.left_match.distance,
            right_distance: crops.right_match.distance,
        },
    };
    Ok((crops, diagnostics))
}
