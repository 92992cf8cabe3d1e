//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (tracing, timeout, request ID, tenant routing)
//! - Bind server to listener
//! - Forward (possibly rewritten) requests to the render upstream
//! - Apply platform rule reloads
//! - Start the admin API when enabled

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode, Uri, Version},
    http::uri::{Authority, PathAndQuery, Scheme},
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::Layer;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::EdgeConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;
use crate::resolver::LookupError;
use crate::routing::classifier::request_host;
use crate::routing::rewriter::X_FORWARDED_HOST;
use crate::routing::{EdgeRouter, RouteDecision, TenantRoutingLayer};

/// Errors building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build resolver client: {0}")]
    Resolver(#[from] LookupError),

    #[error("invalid upstream address '{0}'")]
    InvalidUpstream(String),
}

/// Application state injected into the forwarding handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server for the edge router.
pub struct EdgeServer {
    app: Router,
    config: EdgeConfig,
    router: Arc<EdgeRouter>,
}

impl EdgeServer {
    /// Create a new server resolving custom domains against the configured backend.
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let router = Arc::new(EdgeRouter::from_config(&config)?);
        Self::with_router(config, router)
    }

    /// Create a server around an already-built router (custom lookup or clock).
    pub fn with_router(config: EdgeConfig, router: Arc<EdgeRouter>) -> Result<Self, ServerError> {
        let upstream = Authority::from_str(&config.upstream.address)
            .map_err(|_| ServerError::InvalidUpstream(config.upstream.address.clone()))?;

        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        let state = AppState { client, upstream };
        let app = Self::build_app(&config, router.clone(), state);

        Ok(Self { app, config, router })
    }

    /// Build the Axum app with all middleware layers.
    ///
    /// Tenant routing wraps the inner router so the rewrite happens before
    /// the forwarding handler sees the request.
    #[allow(deprecated)]
    fn build_app(config: &EdgeConfig, router: Arc<EdgeRouter>, state: AppState) -> Router {
        let forward = Router::new()
            .fallback(forward_handler)
            .with_state(state);
        let routed = TenantRoutingLayer::new(router).layer(forward);

        Router::new()
            .fallback_service(routed)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id(req.headers()),
                )
            }))
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Arc<EdgeRouter> {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            platform_domain = %self.config.platform.domain,
            upstream = %self.config.upstream.address,
            "Edge server starting"
        );

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_app = admin::setup_admin_router(admin::AdminState::new(
                self.router.clone(),
                &self.config.admin.api_key,
            ));
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        let router = self.router.clone();
        let mut reloads = ReloadTracker::new(self.config.clone());
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                reloads.apply(&router, &new_config);
            }
        });

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Edge server stopped");
        Ok(())
    }
}

/// Applies config reloads and remembers which sections are waiting on a restart.
struct ReloadTracker {
    /// The config the server was started with.
    active: EdgeConfig,
    pending: Vec<&'static str>,
}

impl ReloadTracker {
    fn new(active: EdgeConfig) -> Self {
        Self {
            active,
            pending: Vec::new(),
        }
    }

    /// Apply a reloaded config. Only the platform rules take effect live.
    fn apply(&mut self, router: &EdgeRouter, new_config: &EdgeConfig) {
        router.update_rules(&new_config.platform);

        let pending = restart_sections(&self.active, new_config);
        if pending == self.pending {
            return;
        }
        if pending.is_empty() {
            tracing::info!("Reloaded settings match the running ones again");
        } else {
            tracing::warn!(sections = ?pending, "Settings changed that only apply after a restart");
        }
        self.pending = pending;
    }
}

/// Sections of `new` that differ from `active` and cannot change live.
fn restart_sections(active: &EdgeConfig, new: &EdgeConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if new.listener != active.listener {
        changed.push("listener");
    }
    if new.resolver != active.resolver {
        changed.push("resolver");
    }
    if new.upstream != active.upstream {
        changed.push("upstream");
    }
    if new.timeouts != active.timeouts {
        changed.push("timeouts");
    }
    if new.observability != active.observability {
        changed.push("observability");
    }
    if new.admin != active.admin {
        changed.push("admin");
    }
    changed
}

/// Forward the request to the render upstream.
async fn forward_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let decision = request.extensions().get::<RouteDecision>().cloned();

    let (mut parts, body) = request.into_parts();

    let original_host = {
        let host = request_host(&parts.headers);
        if host.is_empty() {
            parts.uri.host().map(str::to_string).unwrap_or_default()
        } else {
            host
        }
    };
    if !parts.headers.contains_key(X_FORWARDED_HOST) {
        if let Ok(value) = HeaderValue::from_str(&original_host) {
            parts.headers.insert(X_FORWARDED_HOST, value);
        }
    }
    if !parts.headers.contains_key(header::HOST) {
        if let Ok(value) = HeaderValue::from_str(&original_host) {
            parts.headers.insert(header::HOST, value);
        }
    }

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    tracing::debug!(
        request_id = %request_id,
        host = %original_host,
        decision = decision.as_ref().map(RouteDecision::as_str).unwrap_or("none"),
        path = %parts.uri.path(),
        "Forwarding request"
    );

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_upstream(response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_upstream(502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    #[test]
    fn test_invalid_upstream_rejected() {
        let mut config = EdgeConfig::default();
        config.upstream.address = "not an address".into();
        assert!(matches!(
            EdgeServer::new(config),
            Err(ServerError::InvalidUpstream(_))
        ));
    }

    #[test]
    fn test_reload_swaps_platform_rules() {
        let config = EdgeConfig::default();
        let server = EdgeServer::new(config.clone()).unwrap();

        let mut reloaded = config.clone();
        reloaded.platform = PlatformConfig {
            domain: "folio.example".into(),
            ..Default::default()
        };
        let mut reloads = ReloadTracker::new(config);
        reloads.apply(&server.router(), &reloaded);

        assert_eq!(server.router().classifier().platform_domain(), "folio.example");
        assert!(reloads.pending.is_empty());
    }

    #[test]
    fn test_restart_sections_tracked_across_reloads() {
        let config = EdgeConfig::default();
        let server = EdgeServer::new(config.clone()).unwrap();
        let mut reloads = ReloadTracker::new(config.clone());

        let mut changed = config.clone();
        changed.resolver.timeout_secs = 3;
        changed.timeouts.request_secs = 5;
        changed.admin.enabled = true;
        reloads.apply(&server.router(), &changed);
        assert_eq!(reloads.pending, vec!["resolver", "timeouts", "admin"]);

        // Same file again: still pending, nothing new to report.
        reloads.apply(&server.router(), &changed);
        assert_eq!(reloads.pending, vec!["resolver", "timeouts", "admin"]);

        changed.upstream.address = "render:3000".into();
        reloads.apply(&server.router(), &changed);
        assert_eq!(reloads.pending, vec!["resolver", "upstream", "timeouts", "admin"]);

        reloads.apply(&server.router(), &config);
        assert!(reloads.pending.is_empty());
    }

    #[test]
    fn test_restart_sections_ignores_platform() {
        let config = EdgeConfig::default();
        let mut reloaded = config.clone();
        reloaded.platform.domain = "folio.example".into();
        reloaded.resolver.revalidate_secs = 60;

        assert_eq!(restart_sections(&config, &reloaded), vec!["resolver"]);
    }
}
