//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use folio_edge::resolver::{
    DomainLookup, DomainResolver, LookupError, LookupFuture, ManualClock, ResolutionCache,
    DEFAULT_TTL,
};
use folio_edge::routing::{EdgeRouter, HostClassifier};

/// In-memory lookup that counts every call.
pub struct CountingLookup {
    table: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl CountingLookup {
    pub fn new(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(
                entries
                    .iter()
                    .map(|(d, u)| (d.to_string(), u.to_string()))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Point a domain at a different tenant.
    pub fn reassign(&self, domain: &str, username: &str) {
        self.table
            .lock()
            .unwrap()
            .insert(domain.to_string(), username.to_string());
    }
}

impl DomainLookup for CountingLookup {
    fn lookup<'a>(&'a self, domain: &'a str) -> LookupFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let found = self.table.lock().unwrap().get(domain).cloned();
        Box::pin(async move { found.ok_or(LookupError::Status(reqwest::StatusCode::NOT_FOUND)) })
    }
}

/// A router over the default platform rules with injected lookup and clock.
pub fn edge_router(lookup: Arc<CountingLookup>, clock: Arc<ManualClock>) -> Arc<EdgeRouter> {
    let cache = ResolutionCache::with_clock(DEFAULT_TTL, clock);
    Arc::new(EdgeRouter::new(
        HostClassifier::default(),
        DomainResolver::new(cache, lookup),
    ))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

#[derive(Clone)]
struct ResolveState {
    table: Arc<HashMap<String, String>>,
    hits: Arc<AtomicUsize>,
    cache_control: Arc<Mutex<Option<String>>>,
}

/// Mock platform backend serving `/api/resolve-domain`.
///
/// `malformed.example` answers 200 with a body that is not the expected JSON.
pub struct ResolveBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    cache_control: Arc<Mutex<Option<String>>>,
}

impl ResolveBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Cache-Control header of the last lookup.
    pub fn last_cache_control(&self) -> Option<String> {
        self.cache_control.lock().unwrap().clone()
    }
}

pub async fn start_resolve_backend(entries: &[(&str, &str)]) -> ResolveBackend {
    let state = ResolveState {
        table: Arc::new(
            entries
                .iter()
                .map(|(d, u)| (d.to_string(), u.to_string()))
                .collect(),
        ),
        hits: Arc::new(AtomicUsize::new(0)),
        cache_control: Arc::new(Mutex::new(None)),
    };

    let app = Router::new()
        .route("/api/resolve-domain", get(resolve_domain))
        .with_state(state.clone());

    ResolveBackend {
        addr: serve(app).await,
        hits: state.hits,
        cache_control: state.cache_control,
    }
}

async fn resolve_domain(
    State(state): State<ResolveState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.cache_control.lock().unwrap() = headers
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let domain = params.get("domain").cloned().unwrap_or_default();
    if domain == "malformed.example" {
        return (StatusCode::OK, "<html>oops</html>").into_response();
    }
    if domain == "nameless.example" {
        return Json(json!({ "owner": "someone" })).into_response();
    }
    match state.table.get(&domain) {
        Some(username) => Json(json!({ "username": username })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Domain not found" }))).into_response(),
    }
}

/// Mock render service echoing what it received as JSON.
pub async fn start_render_backend() -> SocketAddr {
    let app = Router::new().fallback(echo);
    serve(app).await
}

async fn echo(uri: Uri, headers: HeaderMap) -> Json<serde_json::Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    Json(json!({
        "path": uri.path(),
        "query": uri.query(),
        "host": header("host"),
        "custom_domain": header("x-custom-domain"),
        "forwarded_host": header("x-forwarded-host"),
        "request_id": header("x-request-id"),
    }))
}
