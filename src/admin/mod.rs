//! Admin API: status, cache inspection and routing dry-runs.

pub mod handlers;
pub mod auth;

use std::sync::Arc;

use axum::{
    routing::get,
    Router,
    middleware,
};
use crate::routing::EdgeRouter;
use self::handlers::*;
use self::auth::admin_auth_middleware;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub router: Arc<EdgeRouter>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(router: Arc<EdgeRouter>, api_key: &str) -> Self {
        Self {
            router,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/cache", get(get_cache))
        .route("/admin/resolve", get(get_resolve))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
