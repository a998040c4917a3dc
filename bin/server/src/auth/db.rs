//! Postgres stores for users and sessions.

use agri_kb_core::UserId;
use agri_kb_platform_access::{Role, Session, SessionId, SessionStore, StoreError, User, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use crate::db::{decode_error, store_error};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
     profile_pic, role, google_id, access_token, role_request, created_at, updated_at";

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: Option<String>,
    first_name: String,
    last_name: String,
    profile_pic: String,
    role: String,
    google_id: Option<String>,
    access_token: Option<String>,
    role_request: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, sqlx::Error> {
        let id = UserId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {e}", self.id)))?;
        let role = Role::from_str(&self.role)
            .map_err(|e| decode_error(format!("invalid role for user '{}': {e}", self.id)))?;
        Ok(User::with_all_fields(
            id,
            self.username,
            self.email,
            self.password_hash,
            self.first_name,
            self.last_name,
            self.profile_pic,
            role,
            self.google_id,
            self.access_token,
            self.role_request,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, StoreError> {
    row.map(UserRow::try_into_user)
        .transpose()
        .map_err(store_error)
}

/// Row type for the Google-id upsert, which also reports whether the row
/// was inserted.
#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    user: UserRow,
    inserted: bool,
}

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, sqlx::Error> {
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {e}", self.user_id)))?;
        Ok(Session::with_all_fields(
            SessionId::new(self.id),
            user_id,
            self.created_at,
            self.expires_at,
        ))
    }
}

/// User store backed by Postgres.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}"))
                .bind(value)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        into_user(row)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("id = $1", &id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("email = lower(trim($1))", email).await
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("google_id = $1", google_id).await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(UserRow::try_into_user)
            .collect::<Result<_, _>>()
            .map_err(store_error)
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(user.id().to_string())
        .bind(user.username())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.profile_pic())
        .bind(user.role().as_str())
        .bind(user.google_id())
        .bind(user.access_token())
        .bind(user.role_request())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users \
             SET username = $2, email = $3, password_hash = $4, first_name = $5, \
                 last_name = $6, profile_pic = $7, updated_at = $8 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id().to_string())
        .bind(user.username())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.profile_pic())
        .bind(user.updated_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        into_user(row)
    }

    async fn set_role(&self, id: UserId, role: Role) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET role = $2, role_request = FALSE, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        into_user(row)
    }

    async fn set_role_request(
        &self,
        id: UserId,
        pending: bool,
    ) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET role_request = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(pending)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        into_user(row)
    }

    async fn set_access_token(
        &self,
        id: UserId,
        access_token: &str,
    ) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET access_token = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        into_user(row)
    }

    async fn link_google(
        &self,
        id: UserId,
        google_id: &str,
        access_token: &str,
    ) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET google_id = $2, access_token = $3, updated_at = NOW() \
             WHERE id = $1 AND google_id IS NULL RETURNING {USER_COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(google_id)
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        into_user(row)
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_by_google_id(&self, user: &User) -> Result<(User, bool), StoreError> {
        // xmax is zero only for a row this statement inserted.
        let row: UpsertRow = sqlx::query_as(&format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (google_id) DO UPDATE \
             SET access_token = EXCLUDED.access_token, updated_at = EXCLUDED.updated_at \
             RETURNING {USER_COLUMNS}, (xmax = 0) AS inserted"
        ))
        .bind(user.id().to_string())
        .bind(user.username())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.profile_pic())
        .bind(user.role().as_str())
        .bind(user.google_id())
        .bind(user.access_token())
        .bind(user.role_request())
        .bind(user.created_at())
        .bind(user.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        let inserted = row.inserted;
        let user = row.user.try_into_user().map_err(store_error)?;
        Ok((user, inserted))
    }
}

/// Session store backed by Postgres.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.user_id().to_string())
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(SessionRow::try_into_session)
            .transpose()
            .map_err(store_error)
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}
