//! HTTP surface for Marginalia.
//!
//! Routes map one-to-one onto [`AnnotationRepository`](marg_core::AnnotationRepository)
//! operations. Repository calls run on the blocking pool; a missing record is
//! `404` with an empty body, a lost write race is `409`, anything else is
//! `500` with a JSON `{"error": ...}` body.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use router::build_router;
pub use server::MarginaliaServer;
