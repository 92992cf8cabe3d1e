//! Per-request tenant routing.
//!
//! # Responsibilities
//! - Run the bypass checks, then resolve, then rewrite
//! - Return an explicit decision for every request
//! - Hold the hot-reloadable platform rules
//!
//! # Design Decisions
//! - Rules live behind ArcSwap: reads are lock-free, reloads are atomic
//! - Unresolved hosts pass through untouched; the render layer 404s them
//! - Nothing here fails a request

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::http::Request;
use serde::Serialize;

use crate::config::{EdgeConfig, PlatformConfig};
use crate::observability::metrics;
use crate::resolver::{DomainResolver, HttpDomainLookup, LookupError, Resolution, ResolutionCache};
use crate::routing::classifier::{normalize_host, request_host, BypassReason, HostClassifier};
use crate::routing::rewriter::{rewrite_path, rewrite_request, strip_custom_domain_marker};

/// What the router did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Forwarded untouched without consulting the resolver.
    Bypass(BypassReason),
    /// Rewritten to the tenant's internal route.
    Rewrite { username: String },
    /// Resolution found no tenant; forwarded untouched.
    Unresolved,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Bypass(reason) => reason.as_str(),
            RouteDecision::Rewrite { .. } => "rewrite",
            RouteDecision::Unresolved => "unresolved",
        }
    }
}

/// Serializable description of a decision, for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionReport {
    pub host: String,
    pub path: String,
    pub decision: &'static str,
    pub username: Option<String>,
    pub internal_path: String,
}

/// The edge request router.
pub struct EdgeRouter {
    classifier: ArcSwap<HostClassifier>,
    resolver: DomainResolver,
}

impl EdgeRouter {
    pub fn new(classifier: HostClassifier, resolver: DomainResolver) -> Self {
        Self {
            classifier: ArcSwap::from_pointee(classifier),
            resolver,
        }
    }

    /// Build a router with the HTTP lookup and a system-clock cache.
    pub fn from_config(config: &EdgeConfig) -> Result<Self, LookupError> {
        let lookup = HttpDomainLookup::new(&config.resolver)?;
        let cache = ResolutionCache::new(Duration::from_secs(config.resolver.cache_ttl_secs));
        Ok(Self::new(
            HostClassifier::from_config(&config.platform),
            DomainResolver::new(cache, Arc::new(lookup)),
        ))
    }

    pub fn classifier(&self) -> Arc<HostClassifier> {
        self.classifier.load_full()
    }

    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    /// Swap in new platform rules. In-flight requests keep the old ones.
    pub fn update_rules(&self, config: &PlatformConfig) {
        let classifier = HostClassifier::from_config(config);
        if *self.classifier.load_full() != classifier {
            tracing::info!(platform_domain = %classifier.platform_domain(), "Platform rules reloaded");
            self.classifier.store(Arc::new(classifier));
        }
    }

    /// Decide how to route a normalized host and path.
    pub async fn decide(&self, host: &str, path: &str) -> RouteDecision {
        let bypass = self.classifier.load().classify(host, path);
        if let Some(reason) = bypass {
            return RouteDecision::Bypass(reason);
        }

        match self.resolver.resolve(host).await {
            Resolution::Resolved { username } => RouteDecision::Rewrite { username },
            Resolution::Unresolved => RouteDecision::Unresolved,
        }
    }

    /// Route a request in place: strip the inbound marker, decide, rewrite.
    pub async fn route<B>(&self, req: &mut Request<B>) -> RouteDecision {
        strip_custom_domain_marker(req);

        let host = host_of(req);
        let path = req.uri().path().to_string();

        let mut decision = self.decide(&host, &path).await;

        if let RouteDecision::Rewrite { username } = &decision {
            match rewrite_request(req, username, &host) {
                Ok(()) => {
                    tracing::debug!(host = %host, path = %path, internal_path = %req.uri().path(), "Rewrote custom-domain request");
                }
                Err(e) => {
                    tracing::warn!(host = %host, username = %username, error = %e, "Resolved username is not routable");
                    decision = RouteDecision::Unresolved;
                }
            }
        }

        metrics::record_decision(decision.as_str());
        decision
    }

    /// Describe the decision for a host and path without a live request.
    pub async fn explain(&self, raw_host: &str, path: &str) -> DecisionReport {
        let host = normalize_host(raw_host);
        let decision = self.decide(&host, path).await;
        let (username, internal_path) = match &decision {
            RouteDecision::Rewrite { username } => {
                (Some(username.clone()), rewrite_path(username, path))
            }
            _ => (None, path.to_string()),
        };

        DecisionReport {
            host,
            path: path.to_string(),
            decision: decision.as_str(),
            username,
            internal_path,
        }
    }
}

/// Host header, falling back to the URI authority (HTTP/2 requests).
fn host_of<B>(req: &Request<B>) -> String {
    let host = request_host(req.headers());
    if host.is_empty() {
        req.uri().host().map(normalize_host).unwrap_or_default()
    } else {
        host
    }
}
