use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use crate::admin::AdminState;
use crate::resolver::cache::CacheEntrySnapshot;
use crate::routing::router::DecisionReport;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub platform_domain: String,
    pub cache_entries: usize,
    pub cache_ttl_secs: u64,
}

#[derive(Serialize)]
pub struct CacheListing {
    pub total: usize,
    pub live: usize,
    pub entries: Vec<CacheEntrySnapshot>,
}

#[derive(Deserialize)]
pub struct ResolveParams {
    pub host: String,
    #[serde(default = "root_path")]
    pub path: String,
}

fn root_path() -> String {
    "/".to_string()
}

pub async fn get_status(
    State(state): State<AdminState>,
) -> Json<SystemStatus> {
    let cache = state.router.resolver().cache();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        platform_domain: state.router.classifier().platform_domain().to_string(),
        cache_entries: cache.len(),
        cache_ttl_secs: cache.ttl().as_secs(),
    })
}

pub async fn get_cache(
    State(state): State<AdminState>,
) -> Json<CacheListing> {
    let entries = state.router.resolver().cache().snapshot();
    Json(CacheListing {
        total: entries.len(),
        live: entries.iter().filter(|e| e.live).count(),
        entries,
    })
}

/// Dry-run the routing decision for a host and path.
///
/// Resolution is real: a successful lookup is cached like any request.
pub async fn get_resolve(
    State(state): State<AdminState>,
    Query(params): Query<ResolveParams>,
) -> Json<DecisionReport> {
    let path = if params.path.starts_with('/') {
        params.path
    } else {
        format!("/{}", params.path)
    };
    Json(state.router.explain(&params.host, &path).await)
}
