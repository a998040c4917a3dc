//! Resolving a Google sign-in to a local account.

use crate::error::StoreError;
use crate::provider::ProviderProfile;
use crate::store::UserStore;
use crate::user::User;

/// Outcome of a Google sign-in.
#[derive(Debug, Clone)]
pub struct GoogleSignIn {
    pub user: User,
    /// True when the sign-in created the account.
    pub created: bool,
}

/// Finds the account for a Google profile, creating it if needed.
///
/// Resolution order:
/// 1. an account already linked to the Google id has its provider token
///    refreshed, leaving every other stored field as it is;
/// 2. an unlinked account with the same email is linked, but only when
///    Google has verified the address;
/// 3. otherwise a new account is inserted through the store's atomic
///    upsert, so concurrent callbacks for the same Google id converge on a
///    single account.
///
/// # Errors
///
/// Propagates store failures. An email held by another account that cannot
/// be linked surfaces as `StoreError::Conflict`.
pub async fn find_or_create_google_user(
    store: &dyn UserStore,
    profile: &ProviderProfile,
) -> Result<GoogleSignIn, StoreError> {
    if let Some(linked) = store.find_by_google_id(&profile.subject).await?
        && let Some(user) = store
            .set_access_token(linked.id(), &profile.access_token)
            .await?
    {
        tracing::debug!(user_id = %user.id(), "refreshed google access token");
        return Ok(GoogleSignIn {
            user,
            created: false,
        });
    }

    if profile.email_verified
        && let Some(local) = store.find_by_email(&profile.email).await?
        && local.google_id().is_none()
        && let Some(user) = store
            .link_google(local.id(), &profile.subject, &profile.access_token)
            .await?
    {
        tracing::info!(user_id = %user.id(), "linked google identity to existing account");
        return Ok(GoogleSignIn {
            user,
            created: false,
        });
    }

    let (user, created) = store
        .upsert_by_google_id(&User::from_provider(profile))
        .await?;
    if created {
        tracing::info!(user_id = %user.id(), "created account from google sign-in");
    }
    Ok(GoogleSignIn { user, created })
}
