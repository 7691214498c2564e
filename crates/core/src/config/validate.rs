use super::{types::Config, ConfigError};
use crate::processor::MAX_WORKERS;

/// Validate configuration
/// Currently validates:
/// - Transcoder bitrate and timeout are not 0
/// - Worker count is within 1..=MAX_WORKERS
/// - Event buffer is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.transcoder.bitrate_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.bitrate_kbps cannot be 0".to_string(),
        ));
    }

    if config.transcoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.timeout_secs cannot be 0".to_string(),
        ));
    }

    if !(1..=MAX_WORKERS).contains(&config.processor.max_workers) {
        return Err(ConfigError::ValidationError(format!(
            "processor.max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.processor.max_workers
        )));
    }

    if config.processor.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "processor.event_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
