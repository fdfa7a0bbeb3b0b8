//! metcrop-io: filesystem side of metcrop.
//!
//! Finds input photographs, writes the three JPEG outputs per photograph,
//! runs batches on a bounded worker pool, looks up specimen
//! classifications, and formats run descriptions. All pixel work is
//! delegated to `metcrop-pipeline`.

pub mod batch;
pub mod describe;
pub mod label;
pub mod output;

pub use batch::{
    BatchError, BatchOptions, BatchReport, PhotoError, PhotoOutcome, PhotoStatus, ProcessedPhoto,
    StdClock, process_batch, process_photo,
};
pub use describe::{DescribeError, RunTemplate, describe_run, write_label_list};
pub use label::{
    ClassificationSource, LookupError, StaticClassifications, lookup_classification,
    normalize_label,
};
pub use output::{OutputKind, OutputPaths, collect_inputs};
