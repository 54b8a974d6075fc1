//! HTTP API for docdesk.
//!
//! Browser-facing document management plus the two endpoints the external
//! editor talks to (session configs and save callbacks).

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{ApiError, ErrorCode};
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
