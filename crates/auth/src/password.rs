//! Credential hashing and comparison (Argon2id).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use backoffice_core::{DomainError, DomainResult};

/// Characters of which a new password must contain at least one.
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*";

pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl From<CredentialError> for DomainError {
    fn from(value: CredentialError) -> Self {
        DomainError::store(value.to_string())
    }
}

/// One-way password hashing plus comparison.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;

    /// Compare `plaintext` against a stored hash. Unparseable hashes never match.
    fn compare(&self, plaintext: &str, hash: &str) -> bool;

    /// Compare against `hash`, or against a throwaway hash when there is no
    /// stored credential, so unknown accounts cost the same as known ones.
    fn compare_or_dummy(&self, plaintext: &str, hash: Option<&str>) -> bool;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    dummy_hash: String,
}

impl Argon2Verifier {
    pub fn new() -> Result<Self, CredentialError> {
        let dummy_hash = hash_with_random_salt("backoffice-dummy-credential")?;
        Ok(Self { dummy_hash })
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        hash_with_random_salt(plaintext)
    }

    fn compare(&self, plaintext: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    fn compare_or_dummy(&self, plaintext: &str, hash: Option<&str>) -> bool {
        match hash {
            Some(hash) => self.compare(plaintext, hash),
            None => {
                let _ = self.compare(plaintext, &self.dummy_hash);
                false
            }
        }
    }
}

fn hash_with_random_salt(plaintext: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Strength rule for passwords chosen on the profile screen.
pub fn validate_new_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(DomainError::validation(format!(
            "password must contain one of {PASSWORD_SPECIALS}"
        )));
    }
    Ok(())
}
