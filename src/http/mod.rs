//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, timeout)
//!     → request.rs (request ID)
//!     → routing (tenant rewrite)
//!     → server.rs (forward to render upstream)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, EdgeServer, ServerError};
