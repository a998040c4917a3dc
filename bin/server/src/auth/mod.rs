//! Authentication for the agri-kb server.
//!
//! This module provides:
//! - Google sign-in through the `IdentityProvider` seam (`google`, `routes`)
//! - Credential verification and role gates as Axum extractors (`middleware`)
//! - Issuing and clearing the session cookies (`issuance`)
//! - Postgres user and session stores (`db`)
//!
//! # Session model
//!
//! A signed-in browser holds two HTTP-only cookies: a short-lived access
//! token signed by this server, and the id of a server-side refresh session.
//! Every protected request verifies the access token and reloads the user,
//! so a role change or account deletion takes effect immediately. The
//! refresh session only mints new access tokens.

pub mod db;
pub mod google;
pub mod issuance;
pub mod middleware;
pub mod routes;

use agri_kb_catalog::CropStore;
use agri_kb_platform_access::{IdentityProvider, LocalTokenCodec, SessionStore, UserStore};
use std::sync::Arc;

use crate::config::ServerConfig;

pub use google::GoogleClient;
pub use middleware::{
    AuthRejection, RequireAdmin, RequireAdminContributor, RequireAdminMod, RequireAuth,
};
pub use routes::{google_callback, google_login};

/// Shared application state.
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub crops: Arc<dyn CropStore>,
    /// Google, or a stand-in under test.
    pub provider: Arc<dyn IdentityProvider>,
    /// Signs and verifies access tokens.
    pub tokens: LocalTokenCodec,
    pub config: ServerConfig,
}

impl AppState {
    /// Creates the application state. The token codec is derived from the
    /// configured secret and access-token lifetime.
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        crops: Arc<dyn CropStore>,
        provider: Arc<dyn IdentityProvider>,
        config: ServerConfig,
    ) -> Self {
        let tokens = LocalTokenCodec::new(
            config.jwt_secret.as_bytes(),
            config.session.access_token_lifetime(),
        );
        Self {
            users,
            sessions,
            crops,
            provider,
            tokens,
            config,
        }
    }
}

/// Removes expired refresh sessions, logging the outcome.
pub async fn purge_expired_sessions(sessions: &dyn SessionStore) {
    match sessions.delete_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(deleted_sessions = count, "Cleaned up expired sessions");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cleanup expired sessions");
        }
    }
}
