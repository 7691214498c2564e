use clap::Parser;
use std::path::PathBuf;

use ncmconv_core::{Config, OutputFormat};

/// Decrypt NetEase Cloud Music `.ncm` files into FLAC and/or MP3.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Files or directories to convert; directories contribute their `.ncm` files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Outputs to keep: lossless (flac), lossy (mp3) or both
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Concurrent conversions (1-4)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// ffmpeg binary used for MP3 output
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// MP3 bitrate in kbps
    #[arg(long)]
    pub bitrate: Option<u32>,

    /// Configuration file (defaults to $NCMCONV_CONFIG, then ./ncmconv.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Applies command line overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(workers) = self.workers {
            config.processor.max_workers = workers;
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.transcoder.ffmpeg_path = ffmpeg.clone();
        }
        if let Some(bitrate) = self.bitrate {
            config.transcoder.bitrate_kbps = bitrate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let args = Args::try_parse_from(["ncmconv", "song.ncm"]).unwrap();
        assert_eq!(args.paths, vec![PathBuf::from("song.ncm")]);
        assert!(args.format.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_paths_required() {
        assert!(Args::try_parse_from(["ncmconv"]).is_err());
    }

    #[test]
    fn test_format_aliases() {
        let args = Args::try_parse_from(["ncmconv", "-f", "flac", "a.ncm"]).unwrap();
        assert_eq!(args.format, Some(OutputFormat::Lossless));

        let args = Args::try_parse_from(["ncmconv", "--format", "both", "a.ncm"]).unwrap();
        assert_eq!(args.format, Some(OutputFormat::Both));

        assert!(Args::try_parse_from(["ncmconv", "--format", "ogg", "a.ncm"]).is_err());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = Args::try_parse_from([
            "ncmconv",
            "--format",
            "lossless",
            "--workers",
            "2",
            "--ffmpeg",
            "/usr/local/bin/ffmpeg",
            "--bitrate",
            "192",
            "a.ncm",
        ])
        .unwrap();

        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.output.format, OutputFormat::Lossless);
        assert_eq!(config.processor.max_workers, 2);
        assert_eq!(
            config.transcoder.ffmpeg_path,
            PathBuf::from("/usr/local/bin/ffmpeg")
        );
        assert_eq!(config.transcoder.bitrate_kbps, 192);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let args = Args::try_parse_from(["ncmconv", "a.ncm"]).unwrap();
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config, Config::default());
    }
}
