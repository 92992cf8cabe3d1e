//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTL within bounds, addresses parse)
//! - Check that bypass rules are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::resolver::MAX_TTL;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("platform.domain must not be empty")]
    EmptyPlatformDomain,

    #[error("platform.domain '{0}' must be a bare hostname (no scheme, port or path)")]
    MalformedPlatformDomain(String),

    #[error("bypass path prefix '{0}' must start with '/'")]
    RelativeBypassPrefix(String),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("resolver.api_base_url '{0}' is not an http(s) URL")]
    InvalidApiUrl(String),

    #[error("{field} '{value}' must be host:port")]
    InvalidUpstream { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{field} must be at most {max_secs} seconds")]
    DurationTooLong { field: &'static str, max_secs: u64 },
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let domain = &config.platform.domain;
    if domain.is_empty() {
        errors.push(ValidationError::EmptyPlatformDomain);
    } else if domain.contains(['/', ':']) || domain.chars().any(char::is_whitespace) {
        errors.push(ValidationError::MalformedPlatformDomain(domain.clone()));
    }

    for prefix in &config.platform.bypass_path_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::RelativeBypassPrefix(prefix.clone()));
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_upstream(&mut errors, "upstream.address", &config.upstream.address);
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    match url::Url::parse(&config.resolver.api_base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidApiUrl(
            config.resolver.api_base_url.clone(),
        )),
    }

    if config.resolver.cache_ttl_secs == 0 {
        errors.push(ValidationError::ZeroDuration("resolver.cache_ttl_secs"));
    } else if config.resolver.cache_ttl_secs > MAX_TTL.as_secs() {
        errors.push(ValidationError::DurationTooLong {
            field: "resolver.cache_ttl_secs",
            max_secs: MAX_TTL.as_secs(),
        });
    }
    if config.resolver.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("resolver.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Upstreams may be DNS names; the connector resolves them per request.
fn check_upstream(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = value
        .parse::<Authority>()
        .is_ok_and(|authority| !authority.host().is_empty() && authority.port_u16().is_some());
    if !valid {
        errors.push(ValidationError::InvalidUpstream {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&EdgeConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = EdgeConfig::default();
        config.platform.domain = "https://folio.skin".into();
        config.platform.bypass_path_prefixes.push("static".into());
        config.resolver.api_base_url = "not a url".into();
        config.resolver.cache_ttl_secs = 0;
        config.upstream.address = "render".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::RelativeBypassPrefix("static".into())));
        assert!(errors.contains(&ValidationError::ZeroDuration("resolver.cache_ttl_secs")));
    }

    #[test]
    fn test_upstream_accepts_hostnames() {
        let mut config = EdgeConfig::default();
        for upstream in ["render:3000", "render.internal:8080", "10.0.0.7:3000", "[::1]:3000"] {
            config.upstream.address = upstream.into();
            assert_eq!(validate_config(&config), Ok(()), "{upstream}");
        }

        for upstream in ["render", "http://render:3000", "render:3000/path", ":3000"] {
            config.upstream.address = upstream.into();
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::InvalidUpstream {
                    field: "upstream.address",
                    value: upstream.into(),
                }]),
                "{upstream}"
            );
        }
    }

    #[test]
    fn test_cache_ttl_upper_bound() {
        let mut config = EdgeConfig::default();
        config.resolver.cache_ttl_secs = 24 * 60 * 60;
        assert!(validate_config(&config).is_ok());

        config.resolver.cache_ttl_secs = u64::MAX;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::DurationTooLong {
                field: "resolver.cache_ttl_secs",
                max_secs: 86_400,
            }])
        );
    }

    #[test]
    fn test_admin_address_only_checked_when_enabled() {
        let mut config = EdgeConfig::default();
        config.admin.bind_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.admin.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
