//! Access-token classification and the locally signed token codec.

use agri_kb_core::UserId;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AuthenticationError;

/// Prefix Google puts on OAuth access tokens.
const GOOGLE_ACCESS_TOKEN_PREFIX: &str = "ya29.";

/// Who issued a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Signed by this server.
    Local,
    /// Issued by the external identity provider.
    Provider,
}

impl TokenKind {
    /// Classifies a token by its shape.
    #[must_use]
    pub fn classify(token: &str) -> Self {
        if token.starts_with(GOOGLE_ACCESS_TOKEN_PREFIX) {
            Self::Provider
        } else {
            Self::Local
        }
    }
}

/// Claims embedded in a locally signed access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalClaims {
    /// The account the token was issued to.
    pub id: UserId,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Signs and verifies HS256 access tokens with a shared secret.
#[derive(Clone)]
pub struct LocalTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl std::fmt::Debug for LocalTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTokenCodec")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl LocalTokenCodec {
    /// Creates a codec whose tokens are valid for `lifetime`.
    #[must_use]
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    /// How long issued tokens remain valid.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for `user_id` starting now.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthenticationError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token for `user_id` as if signed at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError::Signing` if encoding fails.
    pub fn issue_at(
        &self,
        user_id: UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthenticationError> {
        let claims = LocalClaims {
            id: user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AuthenticationError::Signing {
                reason: e.to_string(),
            }
        })
    }

    /// Verifies signature, algorithm, and expiry, then returns the claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenExpired` for expired tokens and `InvalidToken` for
    /// anything else that fails to verify.
    pub fn verify(&self, token: &str) -> Result<LocalClaims, AuthenticationError> {
        decode::<LocalClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthenticationError::TokenExpired,
                _ => AuthenticationError::InvalidToken {
                    reason: e.to_string(),
                },
            })
    }
}
