use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `NCMCONV_TRANSCODER__BITRATE_KBPS=192`.
pub const ENV_PREFIX: &str = "NCMCONV_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Built-in defaults with environment variable overrides
pub fn load_default_config() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

// Field names contain underscores, so nesting uses a double underscore
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[transcoder]
bitrate_kbps = 192

[processor]
max_workers = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.transcoder.bitrate_kbps, 192);
        assert_eq!(config.processor.max_workers, 2);
        assert_eq!(config.output.format, OutputFormat::Lossy);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[transcoder]
bitrate_kbps = "fast"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/ncmconv.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[transcoder]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
extra_args = ["-ar", "44100"]

[output]
format = "lossless"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.transcoder.ffmpeg_path,
            std::path::PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.transcoder.extra_args, vec!["-ar", "44100"]);
        assert_eq!(config.transcoder.timeout_secs, 3600);
        assert_eq!(config.output.format, OutputFormat::Lossless);
    }
}
