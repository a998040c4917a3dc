//! Centralized server configuration.
//!
//! Loaded once at startup via the `config` crate from environment
//! variables. Nested sections use `__` as the separator, so
//! `GOOGLE__CLIENT_ID` fills `google.client_id`.
//!
//! See [`GoogleOAuthConfig`] for the Google sign-in settings.

use agri_kb_platform_access::GoogleOAuthConfig;
use serde::Deserialize;

/// Shortest accepted signing secret, in bytes.
const MIN_JWT_SECRET_BYTES: usize = 32;

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Deployment environment. Cookies are marked `Secure` in production.
    #[serde(default)]
    pub app_env: AppEnv,

    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// PostgreSQL connection URL. Without one the server keeps everything
    /// in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// HS256 secret for access tokens.
    pub jwt_secret: String,

    /// Origin of the browser front end. Used for CORS and for the
    /// post-sign-in redirects.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Directory of built front-end assets served for unknown paths.
    #[serde(default)]
    pub static_dir: Option<String>,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Google sign-in configuration.
    pub google: GoogleOAuthConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,

    /// Refresh session lifetime in hours.
    #[serde(default = "default_refresh_token_hours")]
    pub refresh_token_hours: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_access_token_minutes() -> i64 {
    60
}

fn default_refresh_token_hours() -> i64 {
    24
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token_minutes: default_access_token_minutes(),
            refresh_token_hours: default_refresh_token_hours(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn access_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_minutes)
    }

    #[must_use]
    pub fn refresh_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.refresh_token_hours)
    }
}

impl ServerConfig {
    /// Loads and validates configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` describing the first violation.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(config::ConfigError::Message(format!(
                "JWT_SECRET must be at least {MIN_JWT_SECRET_BYTES} bytes"
            )));
        }
        if self.session.access_token_minutes <= 0 || self.session.refresh_token_hours <= 0 {
            return Err(config::ConfigError::Message(
                "session lifetimes must be positive".to_string(),
            ));
        }
        if self.session.cleanup_interval_seconds == 0 {
            return Err(config::ConfigError::Message(
                "SESSION__CLEANUP_INTERVAL_SECONDS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether cookies carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.app_env == AppEnv::Production
    }

    /// Absolute front-end URL for `path`.
    #[must_use]
    pub fn frontend_link(&self, path: &str) -> String {
        format!("{}{path}", self.frontend_url.trim_end_matches('/'))
    }
}
