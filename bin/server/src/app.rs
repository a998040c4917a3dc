//! Router assembly.

use axum::{
    Router,
    extract::OriginalUri,
    http::{HeaderValue, Method, StatusCode, header},
    response::Response,
    routing::get,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth::{self, AppState};
use crate::error::error_response;
use crate::routes;

/// Builds the complete application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .nest("/api", routes::api_router().fallback(not_found));

    router = match &state.config.static_dir {
        Some(dir) => {
            let index = Path::new(dir).join("index.html");
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => router.fallback(not_found),
    };

    let router = router.with_state(Arc::clone(&state)).layer(TraceLayer::new_for_http());

    match cors_layer(&state.config.frontend_url) {
        Some(cors) => router.layer(cors),
        None => {
            tracing::warn!(
                frontend_url = %state.config.frontend_url,
                "frontend url is not a valid origin; CORS disabled"
            );
            router
        }
    }
}

/// Allows the browser front end to call the API with its cookies.
fn cors_layer(frontend_url: &str) -> Option<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/')).ok()?;
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    )
}

/// Names the full request path, including any `/api` prefix a nested
/// router stripped.
async fn not_found(OriginalUri(uri): OriginalUri) -> Response {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());
    error_response(StatusCode::NOT_FOUND, format!("Not Found - {target}"))
}
