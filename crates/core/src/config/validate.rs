use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Timeout, when set, is not 0
/// - Convert path is not empty
/// - Copy buffer and rename attempts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.magick.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "magick.timeout_secs cannot be 0; omit it to disable the timeout".to_string(),
        ));
    }

    if config.magick.convert_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "magick.convert_path cannot be empty".to_string(),
        ));
    }

    if config.placer.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "placer.buffer_size cannot be 0".to_string(),
        ));
    }

    if config.placer.max_rename_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "placer.max_rename_attempts cannot be 0".to_string(),
        ));
    }

    Ok(())
}
