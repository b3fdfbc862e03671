//! Service wiring: stores, credential verifier, token codec, directory.

use std::sync::Arc;

use thiserror::Error;

use backoffice_auth::{Argon2Verifier, CredentialError, Directory, Hs256TokenCodec, TokenError};
use backoffice_core::{DomainError, DomainResult};
use backoffice_infra::{AccountService, InMemoryOwnedStore, InMemoryUserStore, PlannerService, SeedOutcome, ensure_master};
use backoffice_planner::{CalendarEvent, Memo};

use crate::config::ApiConfig;

pub type Accounts = AccountService<Arc<InMemoryUserStore>, Argon2Verifier, Hs256TokenCodec>;
pub type Planner = PlannerService<Arc<InMemoryOwnedStore<Memo>>, Arc<InMemoryOwnedStore<CalendarEvent>>>;

#[derive(Debug)]
pub struct AppServices {
    pub accounts: Accounts,
    pub planner: Planner,
}

#[derive(Debug, Error)]
pub enum ServiceInitError {
    #[error("token codec: {0}")]
    Token(#[from] TokenError),
    #[error("credential verifier: {0}")]
    Credential(#[from] CredentialError),
    #[error("master account seeding failed: {0}")]
    Seed(#[from] DomainError),
    #[error("startup task failed: {0}")]
    Join(String),
}

/// Build the service graph and seed the master account when configured.
///
/// Blocking: hashes passwords. Call from a blocking context.
pub fn build_services(config: &ApiConfig) -> Result<AppServices, ServiceInitError> {
    let tokens = Hs256TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl)?;
    let verifier = Argon2Verifier::new()?;
    let users = InMemoryUserStore::arc();

    if let Some(seed) = &config.master {
        match ensure_master(&users, &verifier, seed)? {
            SeedOutcome::Created => tracing::info!(email = %seed.email, "master account created"),
            SeedOutcome::AlreadyPresent => tracing::info!(email = %seed.email, "master account already present"),
        }
    }

    Ok(AppServices {
        accounts: AccountService::new(users, verifier, tokens, Directory::default()),
        planner: PlannerService::new(InMemoryOwnedStore::arc(), InMemoryOwnedStore::arc()),
    })
}

/// Run CPU-bound service work (password hashing) off the async workers.
pub async fn run_blocking<T, F>(f: F) -> DomainResult<T>
where
    F: FnOnce() -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::store(format!("blocking task failed: {e}")))?
}
