//! Google OAuth configuration.
//!
//! Fields with defaults can be omitted when loading from the environment;
//! only the client credentials and redirect URI are required.

use serde::Deserialize;

/// Configuration for signing in with Google.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    /// OAuth client id registered with Google. Also the expected audience of
    /// Google access tokens presented as credentials.
    client_id: String,
    /// OAuth client secret.
    client_secret: String,
    /// Callback URL registered with Google (e.g. "https://kb.example.com/auth/google/callback").
    redirect_uri: String,
    /// OIDC issuer used for discovery.
    /// Default: "https://accounts.google.com"
    #[serde(default = "default_issuer_url")]
    issuer_url: String,
    /// Comma-separated scopes to request. `openid` is always added.
    /// Default: "profile,email"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Token introspection endpoint.
    /// Default: "https://oauth2.googleapis.com/tokeninfo"
    #[serde(default = "default_tokeninfo_url")]
    tokeninfo_url: String,
    /// Timeout for every outbound call to Google, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
    /// Front-end path to land on after a successful sign-in.
    #[serde(default = "default_success_path")]
    success_path: String,
    /// Front-end path to land on when consent is denied.
    #[serde(default = "default_failure_path")]
    failure_path: String,
}

fn default_issuer_url() -> String {
    "https://accounts.google.com".to_string()
}

fn default_scopes() -> String {
    "profile,email".to_string()
}

fn default_tokeninfo_url() -> String {
    "https://oauth2.googleapis.com/tokeninfo".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_success_path() -> String {
    "/home".to_string()
}

fn default_failure_path() -> String {
    "/login".to_string()
}

impl GoogleOAuthConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self::builder(client_id, client_secret, redirect_uri).build()
    }

    /// Creates a builder for further customization.
    #[must_use]
    pub fn builder(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> GoogleOAuthConfigBuilder {
        GoogleOAuthConfigBuilder {
            config: Self {
                client_id,
                client_secret,
                redirect_uri,
                issuer_url: default_issuer_url(),
                scopes: default_scopes(),
                tokeninfo_url: default_tokeninfo_url(),
                request_timeout_seconds: default_request_timeout_seconds(),
                success_path: default_success_path(),
                failure_path: default_failure_path(),
            },
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[must_use]
    pub fn tokeninfo_url(&self) -> &str {
        &self.tokeninfo_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_seconds)
    }

    #[must_use]
    pub fn success_path(&self) -> &str {
        &self.success_path
    }

    #[must_use]
    pub fn failure_path(&self) -> &str {
        &self.failure_path
    }
}

/// Builder for `GoogleOAuthConfig`.
#[derive(Debug)]
pub struct GoogleOAuthConfigBuilder {
    config: GoogleOAuthConfig,
}

impl GoogleOAuthConfigBuilder {
    /// Adds a scope unless it is already requested.
    #[must_use]
    pub fn add_scope(mut self, scope: &str) -> Self {
        if !self.config.scopes().contains(&scope) {
            self.config.scopes.push(',');
            self.config.scopes.push_str(scope);
        }
        self
    }

    /// Overrides the issuer used for discovery.
    #[must_use]
    pub fn issuer_url(mut self, url: String) -> Self {
        self.config.issuer_url = url;
        self
    }

    /// Overrides the token introspection endpoint.
    #[must_use]
    pub fn tokeninfo_url(mut self, url: String) -> Self {
        self.config.tokeninfo_url = url;
        self
    }

    #[must_use]
    pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.request_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn build(self) -> GoogleOAuthConfig {
        self.config
    }
}
