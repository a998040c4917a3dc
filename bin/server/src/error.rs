//! HTTP error responses.
//!
//! Every failure leaves the server as JSON `{ "message": ... }`. Internal
//! details are logged here and never sent to the client.

use agri_kb_catalog::CatalogError;
use agri_kb_platform_access::{AuthenticationError, AuthorizationError, StoreError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Message returned for any upstream failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Builds a JSON error response.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Errors returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with a user-facing message.
    BadRequest(&'static str),
    /// 401 with a user-facing message.
    Unauthorized(&'static str),
    /// 404 with a user-facing message.
    NotFound(&'static str),
    /// 500; the details are logged only.
    Internal { details: String },
}

impl ApiError {
    pub fn internal(details: impl std::fmt::Display) -> Self {
        Self::Internal {
            details: details.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
            Self::Unauthorized(message) => error_response(StatusCode::UNAUTHORIZED, message),
            Self::NotFound(message) => error_response(StatusCode::NOT_FOUND, message),
            Self::Internal { details } => {
                tracing::error!(error = %details, "request failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Self::BadRequest("Expected a JSON request body")
            }
            _ => Self::BadRequest("Invalid request body"),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected query string");
        Self::BadRequest("Invalid query parameters")
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected path parameters");
        Self::BadRequest("Invalid path parameters")
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Invalid { .. } => Self::BadRequest("Invalid crop data"),
            CatalogError::Backend { .. } => Self::internal(err),
        }
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::MissingCredential => Self::Unauthorized("Not authorized, no token"),
            AuthenticationError::InvalidCredentials => {
                Self::Unauthorized("Invalid email or password")
            }
            err if err.is_rejection() => Self::Unauthorized("Not authorized, token failed"),
            err => Self::internal(err),
        }
    }
}

impl From<AuthorizationError> for ApiError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::NotAuthenticated => Self::Unauthorized("Not authorized, no token"),
            AuthorizationError::RoleDenied { gate, .. } => Self::Unauthorized(gate.denial_message()),
            AuthorizationError::NotAccountOwner { .. } => {
                Self::Unauthorized("Not authorized for another user's account")
            }
        }
    }
}
