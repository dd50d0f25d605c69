use crate::config::types::{CheckerConfig, Config, OutputConfig, UserAgentConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_checker_config(&config.checker)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates link checking configuration
fn validate_checker_config(config: &CheckerConfig) -> Result<(), ConfigError> {
    if !(20..=60).contains(&config.http_timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "http_timeout_secs must be between 20 and 60, got {}",
            config.http_timeout_secs
        )));
    }

    if !(1..=300).contains(&config.ftp_timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "ftp_timeout_secs must be between 1 and 300, got {}",
            config.ftp_timeout_secs
        )));
    }

    if config.request_delay_ms < 250 {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be >= 250ms, got {}ms",
            config.request_delay_ms
        )));
    }

    if config.max_fetch_attempts == Some(0) {
        return Err(ConfigError::Validation(
            "max_fetch_attempts must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user agent name cannot be empty".to_string(),
        ));
    }

    // Must be a valid product token
    if !config
        .name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "user agent name must contain only alphanumeric characters, '-' and '_', got '{}'",
            config.name
        )));
    }

    if let Some(contact) = &config.contact_url {
        if !contact.contains('@') {
            url::Url::parse(contact)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_root.is_empty() {
        return Err(ConfigError::Validation(
            "results_root cannot be empty".to_string(),
        ));
    }

    Ok(())
}
