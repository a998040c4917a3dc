//! Storage traits for users and refresh sessions.
//!
//! The server holds these as `Arc<dyn _>` so Postgres and in-memory
//! implementations are interchangeable.

use agri_kb_core::UserId;
use async_trait::async_trait;

use crate::error::StoreError;
use crate::role::Role;
use crate::session::{Session, SessionId};
use crate::user::User;

/// Persistence for user accounts.
///
/// Implementations enforce uniqueness of `email` and of `google_id` when
/// present, reporting violations as `StoreError::Conflict`. Writes after
/// creation touch only the fields they name, so an admin's role change is
/// never overwritten by a concurrent profile edit or sign-in.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Looks up an account by email. The argument is normalized first.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError>;

    /// All accounts, oldest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn create(&self, user: &User) -> Result<(), StoreError>;

    /// Writes the self-service profile fields of `user`: username, email,
    /// password hash, names, and picture. The stored role, role request,
    /// and Google linkage are left untouched.
    ///
    /// Returns the stored account, or `None` if no such record exists.
    async fn update_profile(&self, user: &User) -> Result<Option<User>, StoreError>;

    /// Sets the role and clears any pending role request.
    async fn set_role(&self, id: UserId, role: Role) -> Result<Option<User>, StoreError>;

    async fn set_role_request(&self, id: UserId, pending: bool)
    -> Result<Option<User>, StoreError>;

    /// Records the latest Google access token.
    async fn set_access_token(
        &self,
        id: UserId,
        access_token: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Attaches a Google identity to an account that has none.
    ///
    /// Returns `None` if the account is gone or already linked.
    async fn link_google(
        &self,
        id: UserId,
        google_id: &str,
        access_token: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Returns false if no such record existed.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;

    /// Inserts `user` unless an account with its Google id already exists,
    /// in which case only the stored access token is refreshed.
    ///
    /// Returns the stored account and whether it was newly inserted.
    /// Concurrent calls with the same Google id yield exactly one account.
    async fn upsert_by_google_id(&self, user: &User) -> Result<(User, bool), StoreError>;
}

/// Persistence for refresh sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Returns false if no such session existed.
    async fn delete(&self, id: &SessionId) -> Result<bool, StoreError>;

    /// Removes every session belonging to `user_id`.
    async fn delete_all_for_user(&self, user_id: UserId) -> Result<u64, StoreError>;

    /// Removes sessions past their expiry.
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}
