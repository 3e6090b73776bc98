use crate::config::types::{Config, MirrorConfig, OutputConfig, PacingConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_mirror_config(&config.mirror)?;
    validate_pacing_config(&config.pacing)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates mirror configuration
fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http or https, got '{}'",
            base.scheme()
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if !config.accept_language.is_ascii() {
        return Err(ConfigError::Validation(format!(
            "accept-language must be ASCII, got '{}'",
            config.accept_language
        )));
    }

    for referer in &config.referers {
        Url::parse(referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer '{}': {}", referer, e)))?;
    }

    Ok(())
}

/// Validates pacing configuration
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.rate_limit_cooldown_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-limit-cooldown-secs must be >= 1, got {}",
            config.rate_limit_cooldown_secs
        )));
    }

    if config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be <= 10, got {}",
            config.retry_attempts
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.collection_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "collection-path cannot be empty".to_string(),
        ));
    }

    if let Some(dir) = &config.archive_dir {
        if dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "archive-dir cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
