//! User account routes under `/api/users`.

use agri_kb_core::UserId;
use agri_kb_platform_access::{
    AuthorInfo, Role, StoreError, User, UserProfile, hash_password, verify_stored_password,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::auth::{
    AppState, RequireAdmin, RequireAdminMod, RequireAuth,
    issuance::{RefreshOutcome, clear_session_cookies, end_session, issue_session, rotate_session},
};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register).get(list_users))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/request", put(request_role))
        .route("/{id}/author", get(author_info))
}

/// Confirmation body for actions without a resource to return.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::from_str(raw).map_err(|_| ApiError::NotFound("User not found"))
}

async fn load_user(state: &AppState, raw_id: &str) -> Result<User, ApiError> {
    let id = parse_user_id(raw_id)?;
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))
}

fn stored(user: Option<User>) -> Result<User, ApiError> {
    user.ok_or(ApiError::NotFound("User not found"))
}

fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    username: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    email: String,
    password: String,
}

/// Registers a local account and signs it in.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !required(&body.username) || !required(&body.email) || !required(&body.password) {
        return Err(ApiError::BadRequest("Please provide username, email, and password"));
    }
    if state.users.find_by_email(&body.email).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists"));
    }

    let user = User::local(
        body.username,
        body.email,
        Some(hash_password(&body.password)?),
        body.first_name,
        body.last_name,
    );
    match state.users.create(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict { .. }) => {
            return Err(ApiError::BadRequest("User already exists"));
        }
        Err(err) => return Err(err.into()),
    }
    tracing::info!(user_id = %user.id(), "registered local account");

    let jar = issue_session(&state, jar, &user).await?;
    Ok((StatusCode::CREATED, jar, Json(UserProfile::from(&user))))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Signs in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.find_by_email(&body.email).await?;
    let hash = user.as_ref().and_then(User::password_hash);
    if !verify_stored_password(hash, &body.password) {
        return Err(ApiError::Unauthorized("Invalid email or password"));
    }
    let user = user.ok_or(ApiError::Unauthorized("Invalid email or password"))?;

    let jar = issue_session(&state, jar, &user).await?;
    Ok((jar, Json(UserProfile::from(&user))))
}

/// Destroys the refresh session and clears both cookies.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let jar = end_session(&state, jar).await?;
    let body = MessageBody {
        message: "Logged out",
    };
    Ok((jar, Json(body)))
}

/// Trades the refresh cookie for a new pair of session cookies.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let secure = state.config.secure_cookies();
    match rotate_session(&state, jar.clone()).await? {
        RefreshOutcome::Rotated { jar, user } => {
            Ok((jar, Json(UserProfile::from(&user))).into_response())
        }
        RefreshOutcome::Missing => Err(ApiError::Unauthorized("Not authorized, no token")),
        RefreshOutcome::Rejected => Ok((
            clear_session_cookies(jar, secure),
            ApiError::Unauthorized("Not authorized, token failed"),
        )
            .into_response()),
    }
}

async fn get_profile(RequireAuth(caller): RequireAuth) -> Json<UserProfile> {
    Json(UserProfile::from(caller.user()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    profile_pic: Option<String>,
}

/// Updates the caller's own account.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut user = caller.into_user();

    if let Some(email) = body.email.filter(|e| required(e)) {
        if let Some(existing) = state.users.find_by_email(&email).await?
            && existing.id() != user.id()
        {
            return Err(ApiError::BadRequest("Email already in use"));
        }
        user.set_email(&email);
    }
    if let Some(username) = body.username.filter(|u| required(u)) {
        user.set_username(username);
    }
    if body.first_name.is_some() || body.last_name.is_some() {
        let first = body.first_name.unwrap_or_else(|| user.first_name().to_string());
        let last = body.last_name.unwrap_or_else(|| user.last_name().to_string());
        user.set_names(first, last);
    }
    if let Some(profile_pic) = body.profile_pic.filter(|p| required(p)) {
        user.set_profile_pic(profile_pic);
    }
    if let Some(password) = body.password.filter(|p| !p.is_empty()) {
        user.set_password_hash(hash_password(&password)?);
    }

    let user = match state.users.update_profile(&user).await {
        Ok(user) => stored(user)?,
        Err(StoreError::Conflict { .. }) => {
            return Err(ApiError::BadRequest("Email already in use"));
        }
        Err(err) => return Err(err.into()),
    };
    Ok(Json(UserProfile::from(&user)))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    RequireAdminMod(_): RequireAdminMod,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = load_user(&state, &id).await?;
    Ok(Json(UserProfile::from(&user)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminUpdateRequest {
    role: Option<Role>,
    role_request: Option<bool>,
}

/// Changes another account's role or pending role request.
async fn update_user(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<AdminUpdateRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut user = load_user(&state, &id).await?;

    if let Some(role) = body.role {
        tracing::info!(
            admin_id = %admin.user_id(),
            user_id = %user.id(),
            from = %user.role(),
            to = %role,
            "role changed"
        );
        user = stored(state.users.set_role(user.id(), role).await?)?;
    }
    if let Some(pending) = body.role_request {
        user = stored(state.users.set_role_request(user.id(), pending).await?)?;
    }

    Ok(Json(UserProfile::from(&user)))
}

/// Deletes an account with every refresh session and bookmark it holds.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let user = load_user(&state, &id).await?;

    let sessions = state.sessions.delete_all_for_user(user.id()).await?;
    state.crops.clear_bookmarks(user.id()).await?;
    if !state.users.delete(user.id()).await? {
        return Err(ApiError::NotFound("User not found"));
    }
    tracing::info!(
        admin_id = %admin.user_id(),
        user_id = %user.id(),
        sessions,
        "user removed"
    );

    Ok(Json(MessageBody {
        message: "User removed",
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequestBody {
    #[serde(default = "default_role_request")]
    role_request: bool,
}

fn default_role_request() -> bool {
    true
}

/// Flags the caller's own account as asking for elevated privileges.
async fn request_role(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<RoleRequestBody>,
) -> Result<Json<UserProfile>, ApiError> {
    let target = parse_user_id(&id)?;
    caller
        .ensure_owner(target)
        .map_err(|_| ApiError::Unauthorized("Not authorized to request a role for another user"))?;

    let user = stored(state.users.set_role_request(target, body.role_request).await?)?;
    Ok(Json(UserProfile::from(&user)))
}

/// Public byline for a content author.
async fn author_info(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<AuthorInfo>, ApiError> {
    let user = load_user(&state, &id).await?;
    Ok(Json(AuthorInfo::from(&user)))
}
