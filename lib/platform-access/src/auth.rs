//! The authenticated caller and role checks against it.

use agri_kb_core::UserId;

use crate::error::AuthorizationError;
use crate::role::{Gate, Role};
use crate::user::User;

/// How the caller proved who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// A token signed by this server.
    Local,
    /// A Google access token, introspected with the provider.
    Provider,
}

/// A user whose credential has been verified for the current request.
///
/// Role checks always read the role from the freshly loaded record, never
/// from claims carried in the token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user: User,
    credential: CredentialKind,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn new(user: User, credential: CredentialKind) -> Self {
        Self { user, credential }
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn into_user(self) -> User {
        self.user
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user.id()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.user.role()
    }

    #[must_use]
    pub fn credential(&self) -> CredentialKind {
        self.credential
    }

    /// Checks the caller's role against `gate`.
    ///
    /// # Errors
    ///
    /// Returns `RoleDenied` if the role is not in the gate's permitted set.
    pub fn authorize(&self, gate: Gate) -> Result<(), AuthorizationError> {
        if gate.permits(self.role()) {
            Ok(())
        } else {
            Err(AuthorizationError::RoleDenied {
                user_id: self.user_id(),
                role: self.role(),
                gate,
            })
        }
    }

    /// Checks that the caller is acting on their own account.
    ///
    /// # Errors
    ///
    /// Returns `NotAccountOwner` when `target` is someone else.
    pub fn ensure_owner(&self, target: UserId) -> Result<(), AuthorizationError> {
        if self.user_id() == target {
            Ok(())
        } else {
            Err(AuthorizationError::NotAccountOwner {
                user_id: self.user_id(),
                target,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthenticatedUser {
        let mut user = User::local(
            "caller".to_string(),
            "caller@example.com".to_string(),
            None,
            "Cal".to_string(),
            "Ler".to_string(),
        );
        user.set_role(role);
        AuthenticatedUser::new(user, CredentialKind::Local)
    }

    #[test]
    fn admin_passes_every_gate() {
        let admin = caller(Role::Admin);
        assert!(admin.authorize(Gate::Admin).is_ok());
        assert!(admin.authorize(Gate::AdminMod).is_ok());
        assert!(admin.authorize(Gate::AdminContributor).is_ok());
    }

    #[test]
    fn moderator_is_not_a_contributor() {
        let moderator = caller(Role::Moderator);
        assert!(moderator.authorize(Gate::AdminMod).is_ok());

        let err = moderator.authorize(Gate::AdminContributor).unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::RoleDenied {
                user_id: moderator.user_id(),
                role: Role::Moderator,
                gate: Gate::AdminContributor,
            }
        );
    }

    #[test]
    fn plain_user_passes_no_gate() {
        let user = caller(Role::User);
        for gate in [Gate::Admin, Gate::AdminMod, Gate::AdminContributor] {
            assert!(user.authorize(gate).is_err());
        }
    }

    #[test]
    fn ownership_check() {
        let user = caller(Role::User);
        assert!(user.ensure_owner(user.user_id()).is_ok());
        assert!(matches!(
            user.ensure_owner(UserId::new()),
            Err(AuthorizationError::NotAccountOwner { .. })
        ));
    }
}
