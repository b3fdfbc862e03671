//! `backoffice-auth`: authentication, authorization and the user lifecycle.
//!
//! Pure domain crate: no HTTP, no storage. Everything time-dependent takes the
//! clock as an argument, and every option table is injected.
//!
//! - [`token`]: HS256 session token codec over [`claims::SessionClaims`].
//! - [`password`]: Argon2id credential verifier and new-password policy.
//! - [`authorize`]: role hierarchy predicates and the per-operation policy table.
//! - [`user`]: the `UserRecord` aggregate (PENDING -> ACTIVE/SUSPENDED).

pub mod authorize;
pub mod claims;
pub mod directory;
pub mod password;
pub mod principal;
pub mod roles;
pub mod status;
pub mod token;
pub mod user;

pub use authorize::{
    AuthorizationExplanation, AuthzError, Operation, Requirement, authorize, explain, require_role,
    require_self_or_role,
};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use directory::{Directory, Level};
pub use password::{Argon2Verifier, CredentialError, CredentialVerifier, validate_new_password};
pub use principal::Principal;
pub use roles::Role;
pub use status::UserStatus;
pub use token::{Hs256TokenCodec, TokenCodec, TokenError};
pub use user::{NewUser, ProfileChanges, SignupForm, SignupProfile, UserCommand, UserEvent, UserRecord};
