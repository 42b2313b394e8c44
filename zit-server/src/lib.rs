//! zit-server: HTTP API for the zit signal-timing backend
//!
//! Exposes projects, intersections, approach flows and timing outputs over
//! JSON, with bearer-token authentication. Every request that reaches an
//! API route runs inside one database session.

pub mod http;
pub mod state;
pub mod tracing_setup;

pub use state::AppState;
