//! Resolution outcomes and the remote lookup seam.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Outcome of resolving a custom hostname to its tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The hostname belongs to this tenant.
    Resolved { username: String },
    /// No tenant could be determined (unmapped, unverified, or lookup failed).
    Unresolved,
}

impl Resolution {
    pub fn resolved(username: impl Into<String>) -> Self {
        Self::Resolved {
            username: username.into(),
        }
    }

    /// The resolved username, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Resolved { username } => Some(username),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Why a remote lookup produced no tenant.
///
/// Never surfaced to clients; the resolver logs it and answers `Unresolved`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("resolver returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("invalid resolver settings: {0}")]
    Config(String),
}

impl LookupError {
    /// Low-cardinality label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Transport(_) => "transport",
            LookupError::Status(_) => "status",
            LookupError::Payload(_) => "payload",
            LookupError::Config(_) => "config",
        }
    }
}

pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LookupError>> + Send + 'a>>;

/// Remote source of domain → username mappings.
///
/// Implementations return the owning username or the reason none was found.
pub trait DomainLookup: Send + Sync {
    fn lookup<'a>(&'a self, domain: &'a str) -> LookupFuture<'a>;
}
