//! Tenant routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → classifier.rs (static path? platform host? → bypass)
//!     → resolver (custom host → username)
//!     → rewriter.rs (/{username}{path}, x-custom-domain: true)
//!     → Return: RouteDecision
//!
//! Page side:
//!     base_path.rs (x-custom-domain → "" or "/{username}")
//! ```
//!
//! # Design Decisions
//! - Bypass rules compiled at startup, swapped atomically on reload
//! - No regex in hot path (prefix and suffix matching only)
//! - Deterministic: same input and cache state always give the same decision

pub mod base_path;
pub mod classifier;
pub mod middleware;
pub mod rewriter;
pub mod router;

pub use base_path::{site_base_path, SiteMode};
pub use classifier::{BypassReason, HostClassifier};
pub use middleware::TenantRoutingLayer;
pub use router::{EdgeRouter, RouteDecision};
