//! Conversion module: the per-file pipeline.
//!
//! A [`ConversionUnit`] takes one [`ConversionJob`] through
//! `Pending -> Decoding -> (Transcoding) -> Tagging -> Done`, with a side exit
//! to `Failed` from any stage. Outputs land next to the source file:
//!
//! | mode       | kept files           |
//! |------------|----------------------|
//! | `lossless` | `name.flac`          |
//! | `lossy`    | `name.mp3`           |
//! | `both`     | `name.flac name.mp3` |
//!
//! A failed job removes both candidate outputs before reporting.

mod error;
mod paths;
mod types;
mod unit;

pub use error::{ConversionError, JobError};
pub use paths::{
    discard, is_lossy_output, output_key, remove_if_exists, resolve_output_key, OutputPaths,
};
pub use types::{
    has_source_extension, ConversionJob, ConversionResult, FailureKind, MetadataRecord,
    OutputFormat, LOSSLESS_EXTENSION, LOSSY_EXTENSION, SOURCE_EXTENSION,
};
pub use unit::{ConversionUnit, Stage};
