//! Error types for the platform-access crate.
//!
//! - `AuthenticationError`: identity could not be established
//! - `AuthorizationError`: identity established but access refused
//! - `StoreError`: the user or session store failed

use agri_kb_core::UserId;
use std::fmt;

use crate::role::{Gate, Role};

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The request carried no credential at all.
    MissingCredential,
    /// Token could not be decoded or its signature did not verify.
    InvalidToken { reason: String },
    /// Token signature is valid but it has expired.
    TokenExpired,
    /// Provider token was issued for a different client.
    AudienceMismatch { audience: String },
    /// Token is valid but names no known user.
    UserNotFound { subject: String },
    /// Email/password pair did not match an account.
    InvalidCredentials,
    /// Signing a new token failed.
    Signing { reason: String },
    /// Hashing a password failed.
    Hashing { reason: String },
    /// The system random source failed.
    Entropy { reason: String },
}

impl AuthenticationError {
    /// Returns true for failures that mean "the presented credential is not
    /// acceptable", as opposed to absent credentials or internal faults.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken { .. }
                | Self::TokenExpired
                | Self::AudienceMismatch { .. }
                | Self::UserNotFound { .. }
                | Self::InvalidCredentials
        )
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "no credential supplied"),
            Self::InvalidToken { reason } => write!(f, "invalid token: {reason}"),
            Self::TokenExpired => write!(f, "token has expired"),
            Self::AudienceMismatch { audience } => {
                write!(f, "token audience '{audience}' does not match this client")
            }
            Self::UserNotFound { subject } => write!(f, "user not found for subject: {subject}"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::Signing { reason } => write!(f, "failed to sign token: {reason}"),
            Self::Hashing { reason } => write!(f, "failed to hash password: {reason}"),
            Self::Entropy { reason } => write!(f, "random source failure: {reason}"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from authorization checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// No authenticated user was present.
    NotAuthenticated,
    /// The user's role is not in the gate's permitted set.
    RoleDenied {
        user_id: UserId,
        role: Role,
        gate: Gate,
    },
    /// The user tried to act on another user's account.
    NotAccountOwner { user_id: UserId, target: UserId },
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "user is not authenticated"),
            Self::RoleDenied {
                user_id,
                role,
                gate,
            } => write!(f, "user {user_id} with role '{role}' denied by {gate} gate"),
            Self::NotAccountOwner { user_id, target } => {
                write!(f, "user {user_id} may not act on account {target}")
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}

/// Errors from user and session stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    Conflict { field: String },
    /// The backing store failed.
    Backend { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { field } => write!(f, "a record with this {field} already exists"),
            Self::Backend { details } => write!(f, "store error: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}
