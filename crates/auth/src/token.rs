//! Session token codec (HS256 JWT).
//!
//! Issuing and verifying are pure computations: the signing key is injected at
//! construction and the clock is passed to [`TokenCodec::verify`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use backoffice_core::DomainError;

use crate::claims::{SessionClaims, TokenValidationError, validate_claims};

/// Default session lifetime, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 3600;

pub fn default_ttl() -> Duration {
    Duration::seconds(DEFAULT_TTL_SECS)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("no bearer token supplied")]
    Missing,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    BadSignature,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for DomainError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Missing | TokenError::Malformed(_) => DomainError::Unauthenticated,
            TokenError::BadSignature | TokenError::Claims(_) => DomainError::invalid_token(value.to_string()),
            TokenError::MissingSecret | TokenError::Signing(_) => DomainError::store(value.to_string()),
        }
    }
}

/// Issues and verifies signed session tokens.
pub trait TokenCodec: Send + Sync {
    /// Lifetime applied to newly issued sessions.
    fn ttl(&self) -> Duration;

    /// Sign `claims` into a compact token string.
    fn issue(&self, claims: &SessionClaims) -> Result<String, TokenError>;

    /// Verify signature and time window, returning the embedded claims.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError>;
}

/// HMAC-SHA256 JWT codec keyed by a process-wide secret.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Hs256TokenCodec {
    /// Fails closed when `secret` is empty.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn issue(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Claims(TokenValidationError::Expired),
                ErrorKind::ImmatureSignature => TokenError::Claims(TokenValidationError::NotYetValid),
                _ => TokenError::Malformed(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
