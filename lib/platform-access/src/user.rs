//! User accounts and their API views.
//!
//! A `User` is created either by local registration (with a password hash)
//! or by the first Google sign-in (with a Google id and provider token).
//! The record itself is never serialized to clients; handlers return a
//! `UserProfile` or an `AuthorInfo` instead.

use agri_kb_core::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::provider::ProviderProfile;
use crate::role::Role;

/// Picture used for accounts that never supplied one.
pub const DEFAULT_PROFILE_PIC: &str = "https://www.gravatar.com/avatar/?d=mp";

/// A knowledge-base user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    /// Always stored lowercased; unique across accounts.
    email: String,
    /// Argon2 PHC string. Absent for accounts that only sign in with Google.
    password_hash: Option<String>,
    first_name: String,
    last_name: String,
    profile_pic: String,
    role: Role,
    /// Google subject identifier; unique when present.
    google_id: Option<String>,
    /// Most recent Google access token for this account.
    access_token: Option<String>,
    /// Set when the user has asked for elevated privileges.
    role_request: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a locally registered account with the default role.
    #[must_use]
    pub fn local(
        username: String,
        email: String,
        password_hash: Option<String>,
        first_name: String,
        last_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username,
            email: normalize_email(&email),
            password_hash,
            first_name,
            last_name,
            profile_pic: DEFAULT_PROFILE_PIC.to_string(),
            role: Role::default(),
            google_id: None,
            access_token: None,
            role_request: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an account from a Google profile on first sign-in.
    ///
    /// The username is the given and family names run together.
    #[must_use]
    pub fn from_provider(profile: &ProviderProfile) -> Self {
        let first_name = profile.given_name.clone().unwrap_or_default();
        let last_name = profile.family_name.clone().unwrap_or_default();
        let mut user = Self::local(
            format!("{first_name}{last_name}"),
            profile.email.clone(),
            None,
            first_name,
            last_name,
        );
        if let Some(picture) = &profile.picture {
            user.profile_pic = picture.clone();
        }
        user.google_id = Some(profile.subject.clone());
        user.access_token = Some(profile.access_token.clone());
        user
    }

    /// Reconstitutes a user from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: UserId,
        username: String,
        email: String,
        password_hash: Option<String>,
        first_name: String,
        last_name: String,
        profile_pic: String,
        role: Role,
        google_id: Option<String>,
        access_token: Option<String>,
        role_request: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            first_name,
            last_name,
            profile_pic,
            role,
            google_id,
            access_token,
            role_request,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    #[must_use]
    pub fn profile_pic(&self) -> &str {
        &self.profile_pic
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn google_id(&self) -> Option<&str> {
        self.google_id.as_deref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    #[must_use]
    pub fn role_request(&self) -> bool {
        self.role_request
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.touch();
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = normalize_email(email);
        self.touch();
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = Some(password_hash);
        self.touch();
    }

    pub fn set_names(&mut self, first_name: String, last_name: String) {
        self.first_name = first_name;
        self.last_name = last_name;
        self.touch();
    }

    pub fn set_profile_pic(&mut self, profile_pic: String) {
        self.profile_pic = profile_pic;
        self.touch();
    }

    /// Changes the role. Any pending role request is settled by this.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.role_request = false;
        self.touch();
    }

    pub fn set_role_request(&mut self, pending: bool) {
        self.role_request = pending;
        self.touch();
    }

    /// Records the latest Google access token.
    pub fn set_access_token(&mut self, access_token: String) {
        self.access_token = Some(access_token);
        self.touch();
    }

    /// Copies the fields a user edits on their own profile from `edited`.
    pub(crate) fn copy_profile_from(&mut self, edited: &User) {
        self.username.clone_from(&edited.username);
        self.email.clone_from(&edited.email);
        self.password_hash.clone_from(&edited.password_hash);
        self.first_name.clone_from(&edited.first_name);
        self.last_name.clone_from(&edited.last_name);
        self.profile_pic.clone_from(&edited.profile_pic);
        self.updated_at = edited.updated_at;
    }

    /// Attaches a Google identity to an existing local account.
    pub fn link_google(&mut self, google_id: String, access_token: String) {
        self.google_id = Some(google_id);
        self.access_token = Some(access_token);
        self.touch();
    }
}

/// The account as returned to its owner and to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_pic: String,
    pub role: Role,
    pub role_request: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_pic: user.profile_pic.clone(),
            role: user.role,
            role_request: user.role_request,
            created_at: user.created_at,
        }
    }
}

/// Public byline information for content authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_pic: String,
}

impl From<&User> for AuthorInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_pic: user.profile_pic.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google_profile() -> ProviderProfile {
        ProviderProfile {
            subject: "1098765".to_string(),
            email: "Grace@Example.com".to_string(),
            email_verified: true,
            given_name: Some("Grace".to_string()),
            family_name: Some("Hopper".to_string()),
            picture: Some("https://lh3.example.com/grace.png".to_string()),
            access_token: "ya29.first".to_string(),
        }
    }

    #[test]
    fn local_user_defaults() {
        let user = User::local(
            "ada".to_string(),
            "  ADA@example.com ".to_string(),
            Some("$argon2id$...".to_string()),
            "Ada".to_string(),
            "Lovelace".to_string(),
        );

        assert!(user.id().to_string().starts_with("usr_"));
        assert_eq!(user.email(), "ada@example.com");
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.profile_pic(), DEFAULT_PROFILE_PIC);
        assert!(user.google_id().is_none());
        assert!(!user.role_request());
        assert_eq!(user.created_at(), user.updated_at());
    }

    #[test]
    fn provider_user_derives_username_from_names() {
        let user = User::from_provider(&google_profile());

        assert_eq!(user.username(), "GraceHopper");
        assert_eq!(user.email(), "grace@example.com");
        assert_eq!(user.google_id(), Some("1098765"));
        assert_eq!(user.access_token(), Some("ya29.first"));
        assert_eq!(user.profile_pic(), "https://lh3.example.com/grace.png");
        assert!(user.password_hash().is_none());
    }

    #[test]
    fn provider_user_without_picture_gets_default() {
        let mut profile = google_profile();
        profile.picture = None;
        let user = User::from_provider(&profile);
        assert_eq!(user.profile_pic(), DEFAULT_PROFILE_PIC);
    }

    #[test]
    fn set_role_settles_pending_request() {
        let mut user = User::from_provider(&google_profile());
        user.set_role_request(true);
        assert!(user.role_request());

        user.set_role(Role::Contributor);
        assert_eq!(user.role(), Role::Contributor);
        assert!(!user.role_request());
    }

    #[test]
    fn setters_update_timestamp() {
        let mut user = User::from_provider(&google_profile());
        let before = user.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));

        user.set_access_token("ya29.second".to_string());

        assert_eq!(user.access_token(), Some("ya29.second"));
        assert!(user.updated_at() > before);
    }

    #[test]
    fn profile_omits_credentials() {
        let mut user = User::from_provider(&google_profile());
        user.set_password_hash("$argon2id$secret".to_string());

        let json = serde_json::to_value(UserProfile::from(&user)).expect("serialize");
        let object = json.as_object().expect("object");

        assert_eq!(object["username"], "GraceHopper");
        assert_eq!(object["role"], "user");
        assert_eq!(object["roleRequest"], false);
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("accessToken"));
        assert!(!object.contains_key("googleId"));
    }

    #[test]
    fn author_info_is_public_subset() {
        let user = User::from_provider(&google_profile());
        let json = serde_json::to_value(AuthorInfo::from(&user)).expect("serialize");
        let object = json.as_object().expect("object");
        assert_eq!(object.len(), 5);
        assert!(!object.contains_key("email"));
    }
}
