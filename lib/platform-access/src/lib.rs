//! Platform access for the agri-kb knowledge base.
//!
//! This crate provides:
//! - User accounts (`User`) and their API views (`UserProfile`, `AuthorInfo`)
//! - Role classification (`Role`) and the route policy table (`Gate`)
//! - Local session artifacts: signed access tokens (`LocalTokenCodec`) and
//!   server-side refresh sessions (`Session`)
//! - Password hashing
//! - The identity-provider seam (`IdentityProvider`) and its configuration
//! - Storage traits with in-memory implementations
//!
//! # Example
//!
//! ```
//! use agri_kb_platform_access::{Gate, Role, User};
//!
//! let user = User::local(
//!     "ada".to_string(),
//!     "Ada@Example.com".to_string(),
//!     None,
//!     "Ada".to_string(),
//!     "Lovelace".to_string(),
//! );
//! assert_eq!(user.email(), "ada@example.com");
//! assert_eq!(user.role(), Role::User);
//!
//! assert!(Gate::AdminMod.permits(Role::Moderator));
//! assert!(!Gate::Admin.permits(Role::Moderator));
//! ```

pub mod account;
pub mod auth;
pub mod error;
pub mod memory;
pub mod oauth;
pub mod password;
pub mod provider;
pub mod role;
pub mod session;
pub mod store;
pub mod token;
pub mod user;

pub use account::{GoogleSignIn, find_or_create_google_user};
pub use auth::{AuthenticatedUser, CredentialKind};
pub use error::{AuthenticationError, AuthorizationError, StoreError};
pub use memory::{MemorySessionStore, MemoryUserStore};
pub use oauth::{GoogleOAuthConfig, GoogleOAuthConfigBuilder};
pub use password::{hash_password, verify_password, verify_stored_password};
pub use provider::{
    AuthorizationRequest, IdentityProvider, IntrospectedToken, PendingAuthorization,
    ProviderError, ProviderProfile,
};
pub use role::{Gate, Role};
pub use session::{Session, SessionId};
pub use store::{SessionStore, UserStore};
pub use token::{LocalClaims, LocalTokenCodec, TokenKind};
pub use user::{AuthorInfo, DEFAULT_PROFILE_PIC, User, UserProfile};
