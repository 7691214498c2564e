use serde::{Deserialize, Serialize};

use crate::conversion::OutputFormat;
use crate::processor::ProcessorConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output selection
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Files kept per source when the command line does not say otherwise.
    #[serde(default)]
    pub format: OutputFormat,
}
