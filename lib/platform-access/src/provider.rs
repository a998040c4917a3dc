//! The external identity-provider seam.
//!
//! The server talks to Google through `IdentityProvider`: building the
//! consent redirect, exchanging the callback code for a profile, and
//! introspecting provider-issued access tokens presented as credentials.

use agri_kb_core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from identity-provider calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider configuration is unusable (bad URLs, failed discovery).
    Configuration { reason: String },
    /// The authorization code could not be exchanged.
    TokenExchange { reason: String },
    /// The returned ID token failed verification.
    TokenValidation { reason: String },
    /// The provider could not be reached or answered unexpectedly.
    Unavailable { reason: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => write!(f, "provider configuration error: {reason}"),
            Self::TokenExchange { reason } => write!(f, "provider token exchange failed: {reason}"),
            Self::TokenValidation { reason } => {
                write!(f, "provider token validation failed: {reason}")
            }
            Self::Unavailable { reason } => write!(f, "provider unavailable: {reason}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Values that must survive the round trip to the consent screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    /// CSRF state echoed back by the provider.
    pub csrf_token: String,
    /// PKCE code verifier.
    pub pkce_verifier: String,
    /// Nonce bound into the ID token.
    pub nonce: String,
}

/// A consent redirect ready to send to the browser.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Provider consent URL.
    pub url: String,
    /// State to stash until the callback arrives.
    pub pending: PendingAuthorization,
}

/// Profile attributes returned by a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Provider subject identifier.
    pub subject: String,
    pub email: String,
    /// Whether the provider vouches for the email address.
    pub email_verified: bool,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    /// Provider access token issued alongside the profile.
    pub access_token: String,
}

/// Result of introspecting a provider-issued access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectedToken {
    /// Client the token was issued to.
    pub audience: String,
    /// Provider subject identifier of the token owner.
    pub subject: String,
}

/// Operations the server needs from the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The OAuth client id registered with the provider.
    fn client_id(&self) -> &str;

    /// Builds a consent redirect with fresh CSRF, PKCE, and nonce values.
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchanges a callback code for the user's profile.
    async fn exchange_code(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<ProviderProfile, ProviderError>;

    /// Asks the provider who owns `access_token` and for which client.
    ///
    /// Returns `Ok(None)` when the provider does not recognize the token
    /// (unknown, revoked, or expired).
    async fn introspect(
        &self,
        access_token: &str,
    ) -> Result<Option<IntrospectedToken>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_authorization_survives_cookie_encoding() {
        let pending = PendingAuthorization {
            csrf_token: "csrf".to_string(),
            pkce_verifier: "verifier".to_string(),
            nonce: "nonce".to_string(),
        };
        let json = serde_json::to_string(&pending).expect("serialize");
        let parsed: PendingAuthorization = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, pending);
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::Unavailable {
            reason: "timed out".to_string(),
        };
        assert!(err.to_string().contains("timed out"));
    }
}
