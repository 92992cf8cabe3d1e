//! Host and path classification.
//!
//! # Responsibilities
//! - Recognize paths that never need a tenant (assets, API, uploads, files)
//! - Normalize the Host header (strip port, lowercase)
//! - Recognize hosts served as-is (platform, loopback, deploy previews)
//!
//! # Design Decisions
//! - Host matching is case-insensitive
//! - Path matching is case-sensitive
//! - Pure functions of the compiled rules; no I/O

use axum::http::{header, HeaderMap};

use crate::config::PlatformConfig;

/// Why a request skipped tenant resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// Build asset, API, upload, or a path that looks like a file.
    StaticPath,
    /// Platform domain, loopback, or preview deployment host.
    PlatformHost,
}

impl BypassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BypassReason::StaticPath => "static_path",
            BypassReason::PlatformHost => "platform_host",
        }
    }
}

/// Compiled bypass rules.
#[derive(Debug, Clone, PartialEq)]
pub struct HostClassifier {
    platform_domain: String,
    loopback_hosts: Vec<String>,
    preview_suffixes: Vec<String>,
    bypass_path_prefixes: Vec<String>,
}

impl HostClassifier {
    pub fn from_config(config: &PlatformConfig) -> Self {
        let lower = |v: &[String]| -> Vec<String> { v.iter().map(|s| s.to_lowercase()).collect() };
        Self {
            platform_domain: config.domain.to_lowercase(),
            loopback_hosts: lower(&config.loopback_hosts),
            preview_suffixes: lower(&config.preview_suffixes),
            bypass_path_prefixes: config.bypass_path_prefixes.clone(),
        }
    }

    pub fn platform_domain(&self) -> &str {
        &self.platform_domain
    }

    /// True for paths that are forwarded untouched whatever the host.
    pub fn is_bypass_path(&self, path: &str) -> bool {
        path.contains('.')
            || self
                .bypass_path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// True for hosts that need no resolution. Expects a normalized host.
    pub fn is_bypass_host(&self, host: &str) -> bool {
        host == self.platform_domain
            || self.loopback_hosts.iter().any(|h| h == host)
            || self
                .preview_suffixes
                .iter()
                .any(|suffix| host.ends_with(suffix.as_str()))
    }

    /// Classify a request; `None` means the host needs resolution.
    pub fn classify(&self, host: &str, path: &str) -> Option<BypassReason> {
        if self.is_bypass_path(path) {
            Some(BypassReason::StaticPath)
        } else if self.is_bypass_host(host) {
            Some(BypassReason::PlatformHost)
        } else {
            None
        }
    }
}

impl Default for HostClassifier {
    fn default() -> Self {
        Self::from_config(&PlatformConfig::default())
    }
}

/// Strip any `:port` suffix and lowercase.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    // Bracketed IPv6 literal: keep the brackets, drop the port.
    let host = if raw.starts_with('[') {
        match raw.find(']') {
            Some(end) => &raw[..=end],
            None => raw,
        }
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    host.to_lowercase()
}

/// The normalized Host header, or an empty string when absent or not ASCII.
pub fn request_host(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(normalize_host)
        .unwrap_or_default()
}
