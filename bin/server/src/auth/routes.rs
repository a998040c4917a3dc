//! Google sign-in routes.

use agri_kb_platform_access::{PendingAuthorization, find_or_create_google_user};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use time::Duration as TimeDuration;

use super::{
    AppState,
    issuance::{AUTH_STATE_COOKIE, issue_session, removal_cookie, session_cookie},
};
use crate::error::ApiError;
use crate::extract::ApiQuery;

/// How long the browser has to come back from the consent screen.
const AUTH_STATE_MINUTES: i64 = 10;

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    /// Set when the user declined consent.
    error: Option<String>,
}

/// Starts Google sign-in by redirecting to the consent screen.
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.provider.authorization_request();

    let pending = serde_json::to_string(&request.pending).map_err(ApiError::internal)?;
    let cookie = session_cookie(
        AUTH_STATE_COOKIE,
        pending,
        TimeDuration::minutes(AUTH_STATE_MINUTES),
        state.config.secure_cookies(),
    );

    Ok((jar.add(cookie), Redirect::to(&request.url)))
}

/// Completes Google sign-in.
///
/// On success the browser receives the same session cookies as a local
/// login and lands on the front end; credentials never appear in the URL.
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let secure = state.config.secure_cookies();
    let jar_without_state = |jar: CookieJar| jar.add(removal_cookie(AUTH_STATE_COOKIE, secure));

    let code = match (query.error, query.code) {
        (None, Some(code)) => code,
        (error, _) => {
            tracing::info!(
                error = error.as_deref().unwrap_or("missing code"),
                "google sign-in abandoned"
            );
            let failure = state.config.frontend_link(state.config.google.failure_path());
            return Ok((jar_without_state(jar), Redirect::to(&failure)));
        }
    };

    let pending: PendingAuthorization = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(ApiError::BadRequest("Missing auth state"))
        .and_then(|cookie| {
            serde_json::from_str(cookie.value())
                .map_err(|_| ApiError::BadRequest("Invalid auth state"))
        })?;

    let returned_state = query.state.unwrap_or_default();
    let state_matches: bool = returned_state
        .as_bytes()
        .ct_eq(pending.csrf_token.as_bytes())
        .into();
    if !state_matches {
        tracing::warn!("google callback state mismatch");
        return Err(ApiError::BadRequest("CSRF token mismatch"));
    }

    let profile = state
        .provider
        .exchange_code(&code, &pending)
        .await
        .map_err(ApiError::internal)?;

    let sign_in = find_or_create_google_user(state.users.as_ref(), &profile).await?;
    tracing::info!(
        user_id = %sign_in.user.id(),
        created = sign_in.created,
        "google sign-in completed"
    );

    let jar = issue_session(&state, jar_without_state(jar), &sign_in.user).await?;
    let success = state.config.frontend_link(state.config.google.success_path());
    Ok((jar, Redirect::to(&success)))
}
