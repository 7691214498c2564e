//! Transcoder module: turns the decoded lossless file into an MP3 through an
//! external `ffmpeg` process.

mod config;
mod error;
mod ffmpeg;
mod traits;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
