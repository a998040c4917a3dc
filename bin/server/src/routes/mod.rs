//! JSON API routes.

pub mod crops;
pub mod users;

use axum::Router;
use std::sync::Arc;

use crate::auth::AppState;

/// All `/api` routes.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/users", users::router())
        .nest("/crops", crops::router())
}
