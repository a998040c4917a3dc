//! Google identity provider using the openidconnect crate.

use agri_kb_core::Result;
use agri_kb_platform_access::{
    AuthorizationRequest, GoogleOAuthConfig, IdentityProvider, IntrospectedToken,
    PendingAuthorization, ProviderError, ProviderProfile,
};
use async_trait::async_trait;
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, OAuth2TokenResponse,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use serde::Deserialize;

/// Google OAuth client for sign-in and access-token introspection.
pub struct GoogleClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    /// Shared by discovery, code exchange, and introspection; carries the
    /// configured timeout.
    http_client: reqwest::Client,
    config: GoogleOAuthConfig,
}

/// The parts of a tokeninfo response we rely on.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    #[serde(default)]
    sub: Option<String>,
}

impl GoogleClient {
    /// Creates a client by discovering Google's provider metadata.
    pub async fn discover(config: GoogleOAuthConfig) -> Result<Self, ProviderError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string()).map_err(|e| {
            ProviderError::Configuration {
                reason: format!("invalid issuer URL: {e}"),
            }
        })?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ProviderError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| ProviderError::Configuration {
                reason: format!("failed to discover provider: {e}"),
            })?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            ProviderError::Configuration {
                reason: format!("invalid redirect URI: {e}"),
            }
        })?;

        Ok(Self {
            provider_metadata,
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            redirect_url,
            http_client,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GoogleOAuthConfig {
        &self.config
    }
}

#[async_trait]
impl IdentityProvider for GoogleClient {
    fn client_id(&self) -> &str {
        self.config.client_id()
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in self.config.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            pending: PendingAuthorization {
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
                nonce: nonce.secret().clone(),
            },
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<ProviderProfile, ProviderError> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| ProviderError::TokenExchange {
                reason: format!("token endpoint error: {e}"),
            })?
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| ProviderError::TokenExchange {
                reason: format!("token exchange failed: {e}"),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| ProviderError::TokenExchange {
                reason: "no ID token in response".to_string(),
            })?;

        let nonce = Nonce::new(pending.nonce.clone());
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| ProviderError::TokenValidation {
                reason: format!("ID token validation failed: {e}"),
            })?;

        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .ok_or_else(|| ProviderError::TokenValidation {
                reason: "ID token carries no email".to_string(),
            })?;

        Ok(ProviderProfile {
            subject: claims.subject().to_string(),
            email,
            email_verified: claims.email_verified().unwrap_or(false),
            given_name: claims
                .given_name()
                .and_then(|n| n.get(None))
                .map(|n| n.as_str().to_string()),
            family_name: claims
                .family_name()
                .and_then(|n| n.get(None))
                .map(|n| n.as_str().to_string()),
            picture: claims
                .picture()
                .and_then(|p| p.get(None))
                .map(|p| p.as_str().to_string()),
            access_token: token_response.access_token().secret().clone(),
        })
    }

    async fn introspect(
        &self,
        access_token: &str,
    ) -> Result<Option<IntrospectedToken>, ProviderError> {
        let response = self
            .http_client
            .get(self.config.tokeninfo_url())
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable {
                reason: format!("tokeninfo request failed: {e}"),
            })?;

        let status = response.status();
        // Google answers 400 for tokens it does not recognize.
        if status.is_client_error() {
            tracing::debug!(%status, "google rejected access token");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable {
                reason: format!("tokeninfo returned {status}"),
            }
            .into());
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable {
                reason: format!("malformed tokeninfo response: {e}"),
            })?;

        Ok(info.sub.map(|subject| IntrospectedToken {
            audience: info.aud,
            subject,
        }))
    }
}
