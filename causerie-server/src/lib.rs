//! causerie-server library
//!
//! Exposes the HTTP layer so integration tests can build the router against
//! a temporary data directory.

pub mod http;

pub use http::{build_router, AppState};
