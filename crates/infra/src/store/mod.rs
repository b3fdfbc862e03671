//! Record stores.
//!
//! Synchronous traits: every implementation must make single-record
//! create/update atomic. Callers on an async runtime hold no locks across
//! `.await`, so the in-memory implementations use `std::sync::RwLock`.

mod in_memory;

pub use in_memory::{InMemoryOwnedStore, InMemoryUserStore};

use std::sync::Arc;

use serde::Deserialize;

use backoffice_auth::{NewUser, Role, UserRecord, UserStatus};
use backoffice_core::{DomainError, Owned, UserId};

/// Store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    /// Conditional update lost: the stored status is no longer the expected one.
    #[error("status changed concurrently (now {actual})")]
    StatusMismatch { actual: UserStatus },
    /// Conditional update lost: same status, but another write landed first.
    #[error("record changed concurrently (expected version {expected}, found {actual})")]
    VersionMismatch { expected: u64, actual: u64 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => DomainError::NotFound,
            StoreError::DuplicateEmail(email) => DomainError::duplicate_email(email),
            StoreError::StatusMismatch { actual } => DomainError::already_processed(actual),
            e @ StoreError::VersionMismatch { .. } => DomainError::conflict(e.to_string()),
            StoreError::Unavailable(msg) => DomainError::store(msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User Store
// ─────────────────────────────────────────────────────────────────────────────

/// Filters for the administrative user list. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub status: Option<UserStatus>,
    pub role: Option<Role>,
    /// Case-insensitive substring of the team name.
    pub team: Option<String>,
    /// Case-insensitive substring of the department name.
    pub department: Option<String>,
    /// Free text matched against name and email.
    pub q: Option<String>,
}

impl UserFilter {
    pub fn pending() -> Self {
        Self {
            status: Some(UserStatus::Pending),
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        if self.status.is_some_and(|s| s != user.status) {
            return false;
        }
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        if !contains_opt(user.team.as_deref(), self.team.as_deref()) {
            return false;
        }
        if !contains_opt(user.department.as_deref(), self.department.as_deref()) {
            return false;
        }
        match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => contains(&user.name, q) || contains(&user.email, q),
            None => true,
        }
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn contains_opt(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        None => true,
        Some(needle) => haystack.is_some_and(|h| contains(h, needle)),
    }
}

/// What a writer saw when it loaded a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub status: UserStatus,
    pub version: u64,
}

impl Expected {
    pub fn of(user: &UserRecord) -> Self {
        Self {
            status: user.status,
            version: user.version,
        }
    }
}

/// Persistence for user records.
pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Lookup by (already normalized) email.
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new record, assigning its id. Fails on a duplicate email.
    fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Replace an existing record only if it is unchanged since `expected` was
    /// taken. A different stored status is `StatusMismatch`; the same status
    /// at another version is `VersionMismatch`.
    fn update_if_unchanged(&self, expected: Expected, user: &UserRecord) -> Result<(), StoreError>;

    /// Matching records ordered by id.
    fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>, StoreError>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_by_email(email)
    }

    fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        (**self).create(user)
    }

    fn update_if_unchanged(&self, expected: Expected, user: &UserRecord) -> Result<(), StoreError> {
        (**self).update_if_unchanged(expected, user)
    }

    fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>, StoreError> {
        (**self).list(filter)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Owned Record Store
// ─────────────────────────────────────────────────────────────────────────────

/// Persistence for records that belong to a single user.
pub trait OwnedStore<T: Owned>: Send + Sync {
    /// Insert, assigning a fresh id. Returns the stored record.
    fn insert(&self, record: T) -> Result<T, StoreError>;

    fn get(&self, id: T::Id) -> Result<Option<T>, StoreError>;

    fn update(&self, record: &T) -> Result<(), StoreError>;

    fn delete(&self, id: T::Id) -> Result<(), StoreError>;

    fn list_for_owner(&self, owner: UserId) -> Result<Vec<T>, StoreError>;
}

impl<T, S> OwnedStore<T> for Arc<S>
where
    T: Owned,
    S: OwnedStore<T> + ?Sized,
{
    fn insert(&self, record: T) -> Result<T, StoreError> {
        (**self).insert(record)
    }

    fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        (**self).get(id)
    }

    fn update(&self, record: &T) -> Result<(), StoreError> {
        (**self).update(record)
    }

    fn delete(&self, id: T::Id) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn list_for_owner(&self, owner: UserId) -> Result<Vec<T>, StoreError> {
        (**self).list_for_owner(owner)
    }
}
