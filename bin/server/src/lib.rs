//! agri-kb HTTP API server.
//!
//! The library half of the binary: configuration, the authentication
//! boundary, route handlers, and Postgres stores. `main` wires them to a
//! listener; tests drive `app::build_router` directly.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod routes;
