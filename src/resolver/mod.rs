//! Custom-domain resolution subsystem.
//!
//! # Data Flow
//! ```text
//! normalized hostname
//!     → cache.rs (live entry? return username, no I/O)
//!     → remote.rs (GET /api/resolve-domain?domain=...)
//!     → engine.rs (cache success, swallow failure)
//!     → Resolution::Resolved { username } | Resolution::Unresolved
//! ```
//!
//! # Design Decisions
//! - Cache and lookup are injected, never global
//! - Failures are typed internally but collapse to `Unresolved`
//! - No negative caching, no request coalescing, no background refresh

pub mod cache;
pub mod clock;
pub mod engine;
pub mod remote;
pub mod types;

pub use cache::{ResolutionCache, DEFAULT_TTL, MAX_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::DomainResolver;
pub use remote::HttpDomainLookup;
pub use types::{DomainLookup, LookupError, LookupFuture, Resolution};
