//! In-memory stores.
//!
//! Used by the server when no database is configured, and by tests.

use agri_kb_core::UserId;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::role::Role;
use crate::session::{Session, SessionId};
use crate::store::{SessionStore, UserStore};
use crate::user::{User, normalize_email};

/// User store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `change` to the stored record under the write lock.
    async fn modify(&self, id: UserId, change: impl FnOnce(&mut User) + Send) -> Option<User> {
        let mut users = self.users.write().await;
        users.get_mut(&id).map(|user| {
            change(user);
            user.clone()
        })
    }
}

/// Finds the unique field `candidate` would collide on, ignoring the record
/// with the same id.
fn conflicting_field(users: &HashMap<UserId, User>, candidate: &User) -> Option<&'static str> {
    users
        .values()
        .filter(|existing| existing.id() != candidate.id())
        .find_map(|existing| {
            if existing.email() == candidate.email() {
                Some("email")
            } else if candidate.google_id().is_some() && existing.google_id() == candidate.google_id()
            {
                Some("google_id")
            } else {
                None
            }
        })
}

fn conflict(field: &str) -> StoreError {
    StoreError::Conflict {
        field: field.to_string(),
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.google_id() == Some(google_id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at(), u.id()));
        Ok(users)
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id()) {
            return Err(conflict("id"));
        }
        if let Some(field) = conflicting_field(&users, user) {
            return Err(conflict(field));
        }
        users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id()) {
            return Ok(None);
        }
        if let Some(field) = conflicting_field(&users, user) {
            return Err(conflict(field));
        }
        Ok(users.get_mut(&user.id()).map(|stored| {
            stored.copy_profile_from(user);
            stored.clone()
        }))
    }

    async fn set_role(&self, id: UserId, role: Role) -> Result<Option<User>, StoreError> {
        Ok(self.modify(id, |user| user.set_role(role)).await)
    }

    async fn set_role_request(
        &self,
        id: UserId,
        pending: bool,
    ) -> Result<Option<User>, StoreError> {
        Ok(self.modify(id, |user| user.set_role_request(pending)).await)
    }

    async fn set_access_token(
        &self,
        id: UserId,
        access_token: &str,
    ) -> Result<Option<User>, StoreError> {
        let access_token = access_token.to_string();
        Ok(self
            .modify(id, |user| user.set_access_token(access_token))
            .await)
    }

    async fn link_google(
        &self,
        id: UserId,
        google_id: &str,
        access_token: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id() != id && u.google_id() == Some(google_id))
        {
            return Err(conflict("google_id"));
        }
        Ok(users
            .get_mut(&id)
            .filter(|user| user.google_id().is_none())
            .map(|user| {
                user.link_google(google_id.to_string(), access_token.to_string());
                user.clone()
            }))
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn upsert_by_google_id(&self, user: &User) -> Result<(User, bool), StoreError> {
        let Some(google_id) = user.google_id() else {
            return Err(StoreError::Backend {
                details: "upsert requires a google id".to_string(),
            });
        };

        // The write lock spans lookup and insert.
        let mut users = self.users.write().await;
        if let Some(existing) = users
            .values_mut()
            .find(|u| u.google_id() == Some(google_id))
        {
            if let Some(token) = user.access_token() {
                existing.set_access_token(token.to_string());
            }
            return Ok((existing.clone(), false));
        }
        if let Some(field) = conflicting_field(&users, user) {
            return Err(conflict(field));
        }
        users.insert(user.id(), user.clone());
        Ok((user.clone(), true))
    }
}

/// Session store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(conflict("id"));
        }
        sessions.insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn delete_all_for_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id() != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
