//! Tower layer applying tenant routing in front of a service.
//!
//! Wrap a whole router so that rewriting happens before its route matching:
//!
//! ```ignore
//! let pages = Router::new().route("/{username}/designs", get(designs));
//! let app = TenantRoutingLayer::new(edge_router).layer(pages);
//! ```
//!
//! The decision is stored in the request extensions as a [`RouteDecision`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use tower::{Layer, Service};

use crate::routing::router::{EdgeRouter, RouteDecision};

#[derive(Clone)]
pub struct TenantRoutingLayer {
    router: Arc<EdgeRouter>,
}

impl TenantRoutingLayer {
    pub fn new(router: Arc<EdgeRouter>) -> Self {
        Self { router }
    }
}

impl<S> Layer<S> for TenantRoutingLayer {
    type Service = TenantRouting<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantRouting {
            inner,
            router: self.router.clone(),
        }
    }
}

/// Service produced by [`TenantRoutingLayer`].
#[derive(Clone)]
pub struct TenantRouting<S> {
    inner: S,
    router: Arc<EdgeRouter>,
}

impl<S, B> Service<Request<B>> for TenantRouting<S>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let router = self.router.clone();
        // The ready clone must be the one that handles this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let decision: RouteDecision = router.route(&mut req).await;
            req.extensions_mut().insert(decision);
            inner.call(req).await
        })
    }
}
