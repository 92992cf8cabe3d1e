//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `platform.domain`.
pub const ENV_PLATFORM_DOMAIN: &str = "FOLIO_PLATFORM_DOMAIN";
/// Environment variable overriding `resolver.api_base_url`.
pub const ENV_API_URL: &str = "FOLIO_API_URL";
/// Environment variable overriding `upstream.address`.
pub const ENV_UPSTREAM: &str = "FOLIO_UPSTREAM";
/// Environment variable overriding `listener.bind_address`.
pub const ENV_BIND_ADDRESS: &str = "FOLIO_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied before validation.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: EdgeConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the configuration used when no file is given: defaults plus environment.
pub fn config_from_env() -> Result<EdgeConfig, ConfigError> {
    let mut config = EdgeConfig::default();
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `FOLIO_*` environment variables on top of a loaded configuration.
pub fn apply_env_overrides(config: &mut EdgeConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from<F>(config: &mut EdgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(domain) = value(ENV_PLATFORM_DOMAIN) {
        config.platform.domain = domain.trim().to_lowercase();
    }
    if let Some(url) = value(ENV_API_URL) {
        config.resolver.api_base_url = url.trim().to_string();
    }
    if let Some(addr) = value(ENV_UPSTREAM) {
        config.upstream.address = addr.trim().to_string();
    }
    if let Some(addr) = value(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr.trim().to_string();
    }
}
