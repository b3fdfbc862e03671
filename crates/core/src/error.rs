//! Domain error model.
//!
//! Every failure the backoffice can report to a caller has exactly one variant
//! here. Component errors (token codec, policy engine, stores) convert into
//! `DomainError` so services can propagate with `?` and the transport layer
//! can map each kind to a status code without guessing.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No token, or a token that could not be parsed at all.
    #[error("authentication required")]
    Unauthenticated,

    /// A well-formed token with a bad signature, or one that has expired.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Valid identity, insufficient privilege (or not acting on self).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Signup with an email that is already registered.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Login attempted before an administrator approved the account.
    #[error("account is pending approval")]
    AccountPending,

    /// Login attempted on a suspended account.
    #[error("account is suspended")]
    AccountSuspended,

    /// Approve/reject on a record that already left PENDING.
    #[error("already processed (current status: {0})")]
    AlreadyProcessed(String),

    /// The record changed between read and write; the caller should reload.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A value outside an enumerated option set (role, level, status, team).
    #[error("invalid option for {field}: '{value}'")]
    InvalidOption { field: String, value: String },

    /// A requested resource was not found.
    #[error("not found")]
    NotFound,

    /// Unexpected storage/infrastructure fault.
    #[error("store error: {0}")]
    Store(String),
}

impl DomainError {
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail(email.into())
    }

    pub fn already_processed(status: impl core::fmt::Display) -> Self {
        Self::AlreadyProcessed(status.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_option(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidOption {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Unauthenticated => "unauthenticated",
            DomainError::InvalidToken(_) => "invalid_token",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::Validation(_) => "validation_failed",
            DomainError::DuplicateEmail(_) => "duplicate_email",
            DomainError::InvalidCredentials => "invalid_credentials",
            DomainError::AccountPending => "account_pending",
            DomainError::AccountSuspended => "account_suspended",
            DomainError::AlreadyProcessed(_) => "already_processed",
            DomainError::Conflict(_) => "conflict",
            DomainError::InvalidOption { .. } => "invalid_option",
            DomainError::NotFound => "not_found",
            DomainError::Store(_) => "store_error",
        }
    }
}
