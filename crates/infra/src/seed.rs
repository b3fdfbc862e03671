//! Bootstrap of the master account.

use tracing::info;

use backoffice_auth::{CredentialVerifier, NewUser, user::normalize_email};
use backoffice_core::DomainResult;

use crate::store::UserStore;

/// Credentials for the account created on first start.
#[derive(Clone)]
pub struct MasterSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl core::fmt::Debug for MasterSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MasterSeed")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    /// An account with the seed email exists; it is left as is.
    AlreadyPresent,
}

/// Create the ACTIVE/MASTER account unless its email is already registered.
pub fn ensure_master<S, V>(store: &S, verifier: &V, seed: &MasterSeed) -> DomainResult<SeedOutcome>
where
    S: UserStore,
    V: CredentialVerifier,
{
    let email = normalize_email(&seed.email)?;
    if store.find_by_email(&email)?.is_some() {
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let hash = verifier.hash(&seed.password)?;
    let user = store.create(NewUser::master(&email, &seed.name, hash)?)?;
    info!(user_id = %user.id, "master account seeded");
    Ok(SeedOutcome::Created)
}
