use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use backoffice_auth::{NewUser, UserRecord};
use backoffice_core::{Owned, UserId};

use super::{Expected, OwnedStore, StoreError, UserFilter, UserStore};

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} lock poisoned"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct UserTable {
    records: BTreeMap<UserId, UserRecord>,
    /// normalized email -> id
    by_email: HashMap<String, UserId>,
    last_id: i64,
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, UserTable>, StoreError> {
        self.inner.read().map_err(|_| poisoned("user store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, UserTable>, StoreError> {
        self.inner.write().map_err(|_| poisoned("user store"))
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let table = self.read()?;
        let key = email.trim().to_lowercase();
        Ok(table
            .by_email
            .get(&key)
            .and_then(|id| table.records.get(id))
            .cloned())
    }

    fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut table = self.write()?;
        let key = user.email.trim().to_lowercase();
        if table.by_email.contains_key(&key) {
            return Err(StoreError::DuplicateEmail(key));
        }

        table.last_id += 1;
        let id = UserId::new(table.last_id);
        let record = user.into_record(id, Utc::now());
        table.by_email.insert(key, id);
        table.records.insert(id, record.clone());
        Ok(record)
    }

    fn update_if_unchanged(&self, expected: Expected, user: &UserRecord) -> Result<(), StoreError> {
        let mut table = self.write()?;
        let slot = table.records.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        if slot.status != expected.status {
            return Err(StoreError::StatusMismatch { actual: slot.status });
        }
        if slot.version != expected.version {
            return Err(StoreError::VersionMismatch {
                expected: expected.version,
                actual: slot.version,
            });
        }
        *slot = user.clone();
        Ok(())
    }

    fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self
            .read()?
            .records
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Owned records
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct OwnedTable<T: Owned> {
    records: BTreeMap<T::Id, T>,
    last_id: i64,
}

/// In-memory store for memos, calendar events and other per-user records.
#[derive(Debug)]
pub struct InMemoryOwnedStore<T: Owned> {
    inner: RwLock<OwnedTable<T>>,
}

impl<T: Owned> InMemoryOwnedStore<T>
where
    T::Id: Ord,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(OwnedTable {
                records: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl<T: Owned> Default for InMemoryOwnedStore<T>
where
    T::Id: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OwnedStore<T> for InMemoryOwnedStore<T>
where
    T: Owned + Clone + Send + Sync,
    T::Id: Ord + From<i64> + Send + Sync,
{
    fn insert(&self, mut record: T) -> Result<T, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("owned store"))?;
        table.last_id += 1;
        let id = <T::Id as From<i64>>::from(table.last_id);
        record.assign_id(id);
        table.records.insert(id, record.clone());
        Ok(record)
    }

    fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned("owned store"))?;
        Ok(table.records.get(&id).cloned())
    }

    fn update(&self, record: &T) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("owned store"))?;
        let slot = table.records.get_mut(&record.id()).ok_or(StoreError::NotFound)?;
        *slot = record.clone();
        Ok(())
    }

    fn delete(&self, id: T::Id) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("owned store"))?;
        table.records.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn list_for_owner(&self, owner: UserId) -> Result<Vec<T>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned("owned store"))?;
        Ok(table
            .records
            .values()
            .filter(|r| r.owner() == owner)
            .cloned()
            .collect())
    }
}
