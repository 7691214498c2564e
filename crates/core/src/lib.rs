pub mod config;
pub mod conversion;
pub mod decoder;
pub mod processor;
pub mod tagger;
pub mod testing;
pub mod transcoder;

pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
    OutputConfig,
};
pub use conversion::{
    ConversionError, ConversionJob, ConversionResult, ConversionUnit, FailureKind, JobError,
    MetadataRecord, OutputFormat, OutputPaths,
};
pub use decoder::{DecodeError, Decoder, NcmDecoder};
pub use processor::{
    BatchCoordinator, BatchEvent, BatchHandle, BatchSummary, CancelFlag, ProcessorConfig,
};
pub use tagger::{Id3Tagger, TagError, Tagger};
pub use transcoder::{FfmpegTranscoder, TranscodeError, Transcoder, TranscoderConfig};
