//! metcrop: cut standardized training crops out of meteorite specimen
//! photographs.
//!
//! # Usage
//!
//! ```text
//! metcrop process photos/ --output crops/ --workers 8 --seed 1
//! metcrop describe --template description.json --model-name clf H5 L6
//! metcrop label --table classifications.json "NWA 869"
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use metcrop_io::{BatchOptions, PhotoStatus, StaticClassifications};
use metcrop_pipeline::{Dimensions, PipelineConfig, ResampleFilter};
use tracing::{error, info};

/// Cut standardized training crops out of meteorite specimen photographs.
#[derive(Parser)]
#[command(name = "metcrop", version)]
struct Cli {
    /// Increase log verbosity (`-v` debug, `-vv` trace). `RUST_LOG`
    /// overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce `_c`, `_l` and `_r` crops for a photograph or a directory
    /// of photographs.
    Process(ProcessArgs),
    /// Format a run description from a JSON template.
    Describe(DescribeArgs),
    /// Look up specimen classifications in a JSON table.
    Label(LabelArgs),
}

#[derive(Args)]
struct ProcessArgs {
    /// Photograph, or directory of photographs (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Directory the crops are written to. Created if missing.
    #[arg(short, long)]
    output: PathBuf,

    /// Fraction of each axis removed from every edge.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BORDER_PERCENTAGE)]
    border_percentage: f64,

    /// Side of the square reference image.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_REFERENCE_SIZE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(3..))]
    reference_size: u32,

    /// Resampling filter for the reference image.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    reference_filter: Filter,

    /// Width of each side strip.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_STRIP_WIDTH, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    strip_width: u32,

    /// Side of the square candidate crops.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_CROP_SIZE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(3..))]
    crop_size: u32,

    /// Minimum leftover strip height that earns an extra bottom row.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_REMAINDER_THRESHOLD)]
    remainder_threshold: u32,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Number of photographs processed in parallel.
    #[arg(long, default_value_t = metcrop_io::batch::DEFAULT_WORKERS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    workers: usize,

    /// Seed for the crop rotations. Omit to seed from OS entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// JPEG quality of the written crops.
    #[arg(long, default_value_t = metcrop_io::output::DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Print the per-photograph diagnostics report.
    #[arg(long)]
    report: bool,

    /// Print the batch report as JSON instead.
    #[arg(long, conflicts_with = "report")]
    json: bool,
}

#[derive(Args)]
struct DescribeArgs {
    /// JSON template with a `description` field.
    #[arg(long)]
    template: PathBuf,

    /// Value for the `{model_name}` placeholder.
    #[arg(long, default_value = "cnn_meteorite_clf")]
    model_name: String,

    /// Value for the `{data_version}` placeholder.
    #[arg(long, default_value = "pre_release")]
    data_version: String,

    /// Also save the label list as a JSON array at this path.
    #[arg(long)]
    labels_out: Option<PathBuf>,

    /// Class labels the run was trained on.
    labels: Vec<String>,
}

#[derive(Args)]
struct LabelArgs {
    /// JSON object mapping specimen identifiers to classifications.
    #[arg(long)]
    table: PathBuf,

    /// Specimen identifiers to look up.
    #[arg(required = true)]
    identifiers: Vec<String>,
}

/// Reference resampling filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

impl From<Filter> for ResampleFilter {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => Self::Nearest,
            Filter::Triangle => Self::Triangle,
            Filter::CatmullRom => Self::CatmullRom,
            Filter::Gaussian => Self::Gaussian,
            Filter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// Maps a [`ResampleFilter`] to the local CLI [`Filter`] enum.
const fn filter_from_pipeline(f: ResampleFilter) -> Filter {
    match f {
        ResampleFilter::Nearest => Filter::Nearest,
        ResampleFilter::Triangle => Filter::Triangle,
        ResampleFilter::CatmullRom => Filter::CatmullRom,
        ResampleFilter::Gaussian => Filter::Gaussian,
        ResampleFilter::Lanczos3 => Filter::Lanczos3,
    }
}

/// The CLI default filter, derived from
/// [`PipelineConfig::DEFAULT_REFERENCE_FILTER`] so the two cannot
/// silently diverge.
const CLI_DEFAULT_FILTER: Filter = filter_from_pipeline(PipelineConfig::DEFAULT_REFERENCE_FILTER);

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_args(args: &ProcessArgs) -> Result<PipelineConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        border_percentage: args.border_percentage,
        reference_size: Dimensions::square(args.reference_size),
        reference_filter: args.reference_filter.into(),
        strip_width: args.strip_width,
        crop_size: Dimensions::square(args.crop_size),
        remainder_threshold: args.remainder_threshold,
    })
}

fn run_process(args: &ProcessArgs) -> ExitCode {
    let config = match config_from_args(args) {
        Ok(c) => c,
        Err(msg) => {
            error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let inputs = match metcrop_io::collect_inputs(&args.input) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("cannot read {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };
    if inputs.is_empty() {
        error!("no photographs found in {}", args.input.display());
        return ExitCode::FAILURE;
    }

    let options = BatchOptions {
        workers: args.workers,
        seed: args.seed,
        jpeg_quality: args.jpeg_quality,
    };
    let report = match metcrop_io::process_batch(&inputs, &args.output, &config, &options) {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("error serializing batch report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else if args.report {
        for photo in &report.photos {
            if let PhotoStatus::Done(done) = &photo.status {
                println!("{}\n{}\n", photo.input.display(), done.diagnostics.report());
            }
        }
    }

    if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        error!(
            failed = report.failed,
            total = report.photos.len(),
            "some photographs could not be processed"
        );
        ExitCode::FAILURE
    }
}

fn run_describe(args: &DescribeArgs) -> ExitCode {
    let description = match metcrop_io::describe_run(
        &args.template,
        &args.model_name,
        &args.data_version,
        &args.labels,
    ) {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref path) = args.labels_out {
        if let Err(e) = metcrop_io::write_label_list(path, &args.labels) {
            error!("{e}");
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), labels = args.labels.len(), "label list written");
    }

    println!("{description}");
    ExitCode::SUCCESS
}

fn run_label(args: &LabelArgs) -> ExitCode {
    let table = match StaticClassifications::from_path(&args.table) {
        Ok(t) => t,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    for identifier in &args.identifiers {
        match metcrop_io::lookup_classification(&table, identifier) {
            Ok(label) => println!("{identifier}\t{}", label.as_deref().unwrap_or("-")),
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        Command::Process(args) => run_process(args),
        Command::Describe(args) => run_describe(args),
        Command::Label(args) => run_label(args),
    }
}
