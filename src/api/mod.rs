//! API server implementation
//!
//! Provides the proxy check endpoints over HTTP.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
