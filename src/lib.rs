//! Folio edge router library.
//!
//! Maps every inbound request to the tenant whose portfolio it targets:
//! platform-domain requests (`folio.skin/{username}/...`) pass through,
//! custom-domain requests (`edkest.com/...`) are rewritten to
//! `/{username}/...` after resolving the host against the platform backend.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resolver;
pub mod routing;

pub use config::schema::EdgeConfig;
pub use http::EdgeServer;
pub use lifecycle::Shutdown;
pub use resolver::{DomainResolver, Resolution, ResolutionCache};
pub use routing::{site_base_path, EdgeRouter, RouteDecision, SiteMode, TenantRoutingLayer};
