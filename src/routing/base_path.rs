//! Link base path for tenant pages.
//!
//! Pages behind the router are mounted at `/{username}/...`. On the platform
//! domain links keep that prefix; on a custom domain the username is implied
//! by the host, so links start at the root.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::routing::rewriter::X_CUSTOM_DOMAIN;

/// True when the router rewrote this request from a custom domain.
pub fn is_custom_domain(headers: &HeaderMap) -> bool {
    headers
        .get(X_CUSTOM_DOMAIN)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}

/// `""` on a custom domain, `/{username}` on the platform domain.
pub fn site_base_path(headers: &HeaderMap, username: &str) -> String {
    SiteMode::from_headers(headers).base_path(username)
}

/// How the current request reached the tenant's site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteMode {
    Platform,
    CustomDomain,
}

impl SiteMode {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if is_custom_domain(headers) {
            SiteMode::CustomDomain
        } else {
            SiteMode::Platform
        }
    }

    pub fn base_path(&self, username: &str) -> String {
        match self {
            SiteMode::CustomDomain => String::new(),
            SiteMode::Platform => format!("/{username}"),
        }
    }

    /// Tenant-relative link, e.g. `link("alice", "/designs/7")`.
    pub fn link(&self, username: &str, path: &str) -> String {
        let base = self.base_path(username);
        match (base.is_empty(), path) {
            (true, "") => "/".to_string(),
            (false, "" | "/") => base,
            _ => format!("{base}{path}"),
        }
    }
}

impl<S> FromRequestParts<S> for SiteMode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SiteMode::from_headers(&parts.headers))
    }
}
