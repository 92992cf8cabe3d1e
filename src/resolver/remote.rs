//! Backend-backed domain lookup.
//!
//! # Responsibilities
//! - Call `GET /api/resolve-domain?domain={host}` on the platform backend
//! - Ask intermediate caches for a short shared revalidation window
//! - Classify every failure (transport, status, payload) as a `LookupError`
//! - Reject unusable settings up front, as `LookupError::Config`

use std::time::Duration;

use reqwest::header::{HeaderValue, CACHE_CONTROL};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::ResolverConfig;
use crate::resolver::types::{DomainLookup, LookupError, LookupFuture};

/// Path of the backend's resolution endpoint.
pub const RESOLVE_DOMAIN_PATH: &str = "/api/resolve-domain";

#[derive(Debug, Deserialize)]
struct ResolveDomainResponse {
    username: Option<String>,
}

/// Resolves custom domains against the platform backend over HTTP.
#[derive(Clone)]
pub struct HttpDomainLookup {
    client: Client,
    resolve_url: Url,
    cache_control: HeaderValue,
}

impl HttpDomainLookup {
    /// Build a lookup client from resolver settings.
    pub fn new(config: &ResolverConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let cache_control = HeaderValue::from_str(&format!("max-age={}", config.revalidate_secs))
            .map_err(|e| LookupError::Config(format!("cache-control hint: {e}")))?;

        let base = config.api_base_url.trim_end_matches('/');
        let resolve_url = Url::parse(&format!("{base}{RESOLVE_DOMAIN_PATH}"))
            .map_err(|e| LookupError::Config(format!("api base url '{}': {e}", config.api_base_url)))?;

        Ok(Self {
            client,
            resolve_url,
            cache_control,
        })
    }

    /// Full endpoint URL for a domain, with the hostname query-encoded.
    pub fn endpoint(&self, domain: &str) -> Url {
        let mut url = self.resolve_url.clone();
        url.query_pairs_mut().append_pair("domain", domain);
        url
    }

    async fn fetch(&self, domain: &str) -> Result<String, LookupError> {
        let url = self.endpoint(domain);

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, self.cache_control.clone())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(LookupError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let payload: ResolveDomainResponse =
            serde_json::from_slice(&body).map_err(|e| LookupError::Payload(e.to_string()))?;

        match payload.username {
            Some(username) if is_valid_username(&username) => Ok(username),
            Some(username) => Err(LookupError::Payload(format!(
                "unusable username {username:?}"
            ))),
            None => Err(LookupError::Payload("missing username".to_string())),
        }
    }
}

impl DomainLookup for HttpDomainLookup {
    fn lookup<'a>(&'a self, domain: &'a str) -> LookupFuture<'a> {
        Box::pin(self.fetch(domain))
    }
}

/// A username must be usable as a single path segment.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && !username.contains(['/', '?', '#'])
        && !username.chars().any(|c| c.is_whitespace() || c.is_control())
}
