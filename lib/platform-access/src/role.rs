//! Role classification and the route policy table.
//!
//! Every account carries exactly one `Role`. Routes that need more than a
//! signed-in user name a `Gate`; each gate lists the roles it admits.
//! Membership is exact: there is no implied hierarchy between roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role for every new account.
    #[default]
    User,
    /// May author catalog content.
    Contributor,
    /// May review users and content.
    Moderator,
    /// Full administrative access.
    Admin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 4] = [Role::User, Role::Contributor, Role::Moderator, Role::Admin];

    /// Returns the storage/wire name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Contributor => "contributor",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A route class that admits a fixed set of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Administrators only.
    Admin,
    /// Administrators and moderators.
    AdminMod,
    /// Administrators and contributors.
    AdminContributor,
}

impl Gate {
    /// Returns the roles this gate admits.
    #[must_use]
    pub const fn permitted(&self) -> &'static [Role] {
        match self {
            Self::Admin => &[Role::Admin],
            Self::AdminMod => &[Role::Admin, Role::Moderator],
            Self::AdminContributor => &[Role::Admin, Role::Contributor],
        }
    }

    /// Returns true if `role` is admitted by this gate.
    #[must_use]
    pub fn permits(&self, role: Role) -> bool {
        self.permitted().contains(&role)
    }

    /// The message returned to callers refused by this gate.
    #[must_use]
    pub const fn denial_message(&self) -> &'static str {
        match self {
            Self::Admin => "Not authorized as an admin",
            Self::AdminMod => "Not authorized as an admin or moderator",
            Self::AdminContributor => "Not authorized as an admin or contributor",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::AdminMod => "adminMod",
            Self::AdminContributor => "adminContributor",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_role_is_lowest_privilege() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn role_names_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_serialization_format() {
        let json = serde_json::to_string(&Role::Moderator).expect("serialize");
        assert_eq!(json, "\"moderator\"");
        let parsed: Role = serde_json::from_str("\"contributor\"").expect("deserialize");
        assert_eq!(parsed, Role::Contributor);
    }

    #[test]
    fn admin_gate_admits_only_admins() {
        assert!(Gate::Admin.permits(Role::Admin));
        assert!(!Gate::Admin.permits(Role::Moderator));
        assert!(!Gate::Admin.permits(Role::Contributor));
        assert!(!Gate::Admin.permits(Role::User));
    }

    #[test]
    fn admin_mod_gate_has_no_hierarchy() {
        assert!(Gate::AdminMod.permits(Role::Admin));
        assert!(Gate::AdminMod.permits(Role::Moderator));
        assert!(!Gate::AdminMod.permits(Role::Contributor));
        assert!(!Gate::AdminMod.permits(Role::User));
    }

    #[test]
    fn admin_contributor_gate_excludes_moderators() {
        assert!(Gate::AdminContributor.permits(Role::Admin));
        assert!(Gate::AdminContributor.permits(Role::Contributor));
        assert!(!Gate::AdminContributor.permits(Role::Moderator));
        assert!(!Gate::AdminContributor.permits(Role::User));
    }

    #[test]
    fn denial_messages_describe_the_gate() {
        assert_eq!(Gate::Admin.denial_message(), "Not authorized as an admin");
        assert_eq!(
            Gate::AdminMod.denial_message(),
            "Not authorized as an admin or moderator"
        );
        assert_eq!(
            Gate::AdminContributor.denial_message(),
            "Not authorized as an admin or contributor"
        );
    }
}
