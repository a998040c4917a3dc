//! Issuing, rotating, and clearing session cookies.

use agri_kb_platform_access::{Session, SessionId, User};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;

use super::AppState;
use crate::error::ApiError;

/// Access token cookie name.
pub const ACCESS_COOKIE: &str = "token";

/// Refresh session cookie name.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Auth state cookie name (CSRF, PKCE, and nonce during the Google flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Builds an HTTP-only cookie with the attributes every session cookie shares.
pub fn session_cookie(
    name: &'static str,
    value: String,
    max_age: TimeDuration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// A cookie that tells the browser to drop `name`.
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    session_cookie(name, String::new(), TimeDuration::ZERO, secure)
}

fn to_time(duration: chrono::Duration) -> TimeDuration {
    TimeDuration::seconds(duration.num_seconds())
}

/// Signs an access token and persists a refresh session for `user`, then
/// sets both cookies.
pub async fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<CookieJar, ApiError> {
    let secure = state.config.secure_cookies();
    let access_token = state.tokens.issue(user.id())?;

    let refresh_lifetime = state.config.session.refresh_token_lifetime();
    let session = Session::new(SessionId::generate()?, user.id(), refresh_lifetime);
    state.sessions.create(&session).await?;

    tracing::debug!(user_id = %user.id(), "issued session");

    Ok(jar
        .add(session_cookie(
            ACCESS_COOKIE,
            access_token,
            to_time(state.tokens.lifetime()),
            secure,
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            session.id().as_str().to_string(),
            to_time(refresh_lifetime),
            secure,
        )))
}

/// Outcome of trading a refresh cookie for new session artifacts.
pub enum RefreshOutcome {
    /// New cookies were issued for this user.
    Rotated { jar: CookieJar, user: User },
    /// No refresh cookie was presented.
    Missing,
    /// The refresh session is unknown, expired, or its user is gone.
    Rejected,
}

/// Replaces the refresh session named by the request's cookie with a new
/// one and issues a fresh access token.
pub async fn rotate_session(state: &AppState, jar: CookieJar) -> Result<RefreshOutcome, ApiError> {
    let Some(cookie) = jar.get(REFRESH_COOKIE).filter(|c| !c.value().is_empty()) else {
        return Ok(RefreshOutcome::Missing);
    };
    let session_id = SessionId::new(cookie.value().to_string());

    let Some(session) = state.sessions.find_by_id(&session_id).await? else {
        tracing::debug!("refresh session not found");
        return Ok(RefreshOutcome::Rejected);
    };

    // Single use: the presented session is gone whether or not rotation succeeds.
    state.sessions.delete(&session_id).await?;

    if session.is_expired() {
        tracing::debug!(user_id = %session.user_id(), "refresh session expired");
        return Ok(RefreshOutcome::Rejected);
    }

    let Some(user) = state.users.find_by_id(session.user_id()).await? else {
        tracing::debug!(user_id = %session.user_id(), "refresh session names a deleted user");
        return Ok(RefreshOutcome::Rejected);
    };

    let jar = issue_session(state, jar, &user).await?;
    Ok(RefreshOutcome::Rotated { jar, user })
}

/// Destroys the refresh session named by the request's cookie (if any) and
/// clears both session cookies.
pub async fn end_session(state: &AppState, jar: CookieJar) -> Result<CookieJar, ApiError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE).filter(|c| !c.value().is_empty()) {
        let session_id = SessionId::new(cookie.value().to_string());
        state.sessions.delete(&session_id).await?;
    }
    Ok(clear_session_cookies(jar, state.config.secure_cookies()))
}

/// Expires both session cookies.
pub fn clear_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(removal_cookie(ACCESS_COOKIE, secure))
        .add(removal_cookie(REFRESH_COOKIE, secure))
}
