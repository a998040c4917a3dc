//! Credential verification and role gates as Axum extractors.

use agri_kb_platform_access::{
    AuthenticatedUser, AuthenticationError, CredentialKind, Gate, TokenKind,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::{AppState, issuance::ACCESS_COOKIE};
use crate::error::{INTERNAL_ERROR_MESSAGE, error_response};

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// No credential on the request.
    NoToken,
    /// A credential was presented but not accepted.
    TokenFailed,
    /// The user's role is not admitted by the gate.
    Denied(Gate),
    /// A store or the provider could not be reached.
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NoToken => error_response(StatusCode::UNAUTHORIZED, "Not authorized, no token"),
            Self::TokenFailed => {
                error_response(StatusCode::UNAUTHORIZED, "Not authorized, token failed")
            }
            Self::Denied(gate) => error_response(StatusCode::UNAUTHORIZED, gate.denial_message()),
            Self::InternalError => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

/// Reads the credential from the `token` cookie, falling back to an
/// `Authorization: Bearer` header.
fn presented_token(jar: &CookieJar, parts: &Parts) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn rejected(err: &AuthenticationError) -> AuthRejection {
    tracing::debug!(error = %err, "credential rejected");
    AuthRejection::TokenFailed
}

fn upstream(err: impl std::fmt::Display) -> AuthRejection {
    tracing::error!(error = %err, "credential verification failed upstream");
    AuthRejection::InternalError
}

/// Resolves `token` to the user it was issued for.
pub async fn verify_credential(
    state: &AppState,
    token: &str,
) -> Result<AuthenticatedUser, AuthRejection> {
    match TokenKind::classify(token) {
        TokenKind::Local => {
            let claims = state.tokens.verify(token).map_err(|e| rejected(&e))?;
            let user = state
                .users
                .find_by_id(claims.id)
                .await
                .map_err(upstream)?
                .ok_or_else(|| {
                    rejected(&AuthenticationError::UserNotFound {
                        subject: claims.id.to_string(),
                    })
                })?;
            Ok(AuthenticatedUser::new(user, CredentialKind::Local))
        }
        TokenKind::Provider => {
            let introspected = state
                .provider
                .introspect(token)
                .await
                .map_err(upstream)?
                .ok_or_else(|| {
                    rejected(&AuthenticationError::InvalidToken {
                        reason: "provider did not recognize token".to_string(),
                    })
                })?;

            let audience_matches: bool = introspected
                .audience
                .as_bytes()
                .ct_eq(state.provider.client_id().as_bytes())
                .into();
            if !audience_matches {
                return Err(rejected(&AuthenticationError::AudienceMismatch {
                    audience: introspected.audience,
                }));
            }

            let user = state
                .users
                .find_by_google_id(&introspected.subject)
                .await
                .map_err(upstream)?
                .ok_or_else(|| {
                    rejected(&AuthenticationError::UserNotFound {
                        subject: introspected.subject.clone(),
                    })
                })?;
            Ok(AuthenticatedUser::new(user, CredentialKind::Provider))
        }
    }
}

/// Extractor for requiring an authenticated user.
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::InternalError)?;

        let token = presented_token(&jar, parts).ok_or(AuthRejection::NoToken)?;
        let user = verify_credential(&app_state, &token).await?;
        Ok(RequireAuth(user))
    }
}

/// Defines an extractor that requires an authenticated user admitted by a gate.
macro_rules! gated_extractor {
    ($(#[$meta:meta])* $name:ident, $gate:expr) => {
        $(#[$meta])*
        pub struct $name(pub AuthenticatedUser);

        impl<S> FromRequestParts<S> for $name
        where
            Arc<AppState>: FromRef<S>,
            S: Send + Sync,
        {
            type Rejection = AuthRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
                let gate = $gate;
                if let Err(err) = user.authorize(gate) {
                    tracing::warn!(user_id = %user.user_id(), error = %err, "gate denied request");
                    return Err(AuthRejection::Denied(gate));
                }
                Ok($name(user))
            }
        }
    };
}

gated_extractor!(
    /// Extractor for routes restricted to administrators.
    RequireAdmin,
    Gate::Admin
);

gated_extractor!(
    /// Extractor for routes open to administrators and moderators.
    RequireAdminMod,
    Gate::AdminMod
);

gated_extractor!(
    /// Extractor for routes open to administrators and contributors.
    RequireAdminContributor,
    Gate::AdminContributor
);
