//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Platform domain and bypass rules.
    pub platform: PlatformConfig,

    /// Custom-domain resolution settings.
    pub resolver: ResolverConfig,

    /// Render service the edge forwards to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Which hosts and paths skip tenant resolution.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlatformConfig {
    /// The shared platform hostname (e.g., "folio.skin").
    pub domain: String,

    /// Hosts always served as-is (exact match).
    pub loopback_hosts: Vec<String>,

    /// Hostname suffixes of the hosting provider's preview deployments.
    pub preview_suffixes: Vec<String>,

    /// Path prefixes that are never rewritten (build assets, API, uploads).
    pub bypass_path_prefixes: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            domain: "folio.skin".to_string(),
            loopback_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            preview_suffixes: vec![".vercel.app".to_string()],
            bypass_path_prefixes: vec![
                "/_next".to_string(),
                "/api".to_string(),
                "/uploads".to_string(),
            ],
        }
    }
}

/// Custom-domain resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the backend serving `/api/resolve-domain`.
    pub api_base_url: String,

    /// How long a successful resolution stays cached, in seconds.
    pub cache_ttl_secs: u64,

    /// Shared revalidation window sent to intermediate caches, in seconds.
    pub revalidate_secs: u64,

    /// HTTP client timeout for the lookup, in seconds.
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            cache_ttl_secs: 300,
            revalidate_secs: 300,
            timeout_secs: 10,
        }
    }
}

/// Render service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Render service address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "folio_edge=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: EdgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.platform.domain, "folio.skin");
        assert_eq!(config.resolver.cache_ttl_secs, 300);
        assert!(config.platform.loopback_hosts.contains(&"localhost".to_string()));
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config: EdgeConfig =
            toml::from_str(include_str!("../../folio-edge.example.toml")).unwrap();
        let defaults = EdgeConfig::default();

        assert_eq!(config.platform, defaults.platform);
        assert_eq!(config.resolver.api_base_url, defaults.resolver.api_base_url);
        assert_eq!(config.upstream.address, defaults.upstream.address);
        assert_eq!(config.observability.log_level, defaults.observability.log_level);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: EdgeConfig = toml::from_str(
            r#"
            [platform]
            domain = "example.org"

            [resolver]
            api_base_url = "http://backend:8000"
            "#,
        )
        .unwrap();

        assert_eq!(config.platform.domain, "example.org");
        assert_eq!(config.platform.preview_suffixes, vec![".vercel.app".to_string()]);
        assert_eq!(config.resolver.api_base_url, "http://backend:8000");
        assert_eq!(config.resolver.revalidate_secs, 300);
    }
}
