//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + FOLIO_* environment
//!     → loader.rs (parse, deserialize, apply overrides)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the platform rules
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only platform rules hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigError, config_from_env, load_config};
pub use schema::EdgeConfig;
pub use schema::ListenerConfig;
pub use schema::PlatformConfig;
pub use schema::ResolverConfig;
pub use schema::UpstreamConfig;
pub use schema::ObservabilityConfig;
pub use schema::AdminConfig;
