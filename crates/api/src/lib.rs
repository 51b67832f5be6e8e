//! Cadence API server library.
//!
//! Exposes configuration, state, error handling, routes and background jobs
//! so integration tests and the binary entrypoint share the same pieces.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
