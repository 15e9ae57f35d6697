// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;

/// Validate configuration and report the effective settings.
pub fn run_validate(config: &Config) -> Result<()> {
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::info!("Config OK");
    log::info!("    Analyzer endpoint: {}", config.analyzer.endpoint);
    log::info!("    Analyzer timeout: {}s", config.analyzer.timeout_secs);
    log::info!(
        "    API key ({}): {}",
        config.analyzer.api_key_env,
        if config.analyzer.api_key().is_ok() {
            "set"
        } else {
            "missing"
        }
    );
    log::info!("    Import endpoint: {}", config.backend.import_url()?);
    log::info!(
        "    Bearer token ({}): {}",
        config.backend.token_env,
        if config.backend.token().is_some() {
            "set"
        } else {
            "not set"
        }
    );
    log::info!("    Max images per scan: {}", config.input.max_images);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_validate_default() {
        assert!(run_validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_run_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.analyzer.endpoint = "not a url".to_string();
        assert!(run_validate(&config).is_err());
    }
}
