use crate::config::types::{Config, DownloaderConfig, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_downloader_config(&config.downloader)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates downloader configuration
fn validate_downloader_config(config: &DownloaderConfig) -> Result<(), ConfigError> {
    if let Some(parallelism) = config.parallelism {
        if parallelism < 1 {
            return Err(ConfigError::Validation(format!(
                "parallelism must be >= 1 when set, got {}",
                parallelism
            )));
        }
    }

    if let Some(timeout) = config.request_timeout_secs {
        if timeout < 1 {
            return Err(ConfigError::Validation(format!(
                "request_timeout_secs must be >= 1 when set, got {}",
                timeout
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "root_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
