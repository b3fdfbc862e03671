//! Entity traits: identity + continuity across state changes.

use crate::id::UserId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// An entity that belongs to exactly one user (memos, calendar events).
///
/// Stores use this to scope listings; the policy layer uses it to decide
/// whether a caller is acting on their own data.
pub trait Owned: Entity {
    fn owner(&self) -> UserId;

    /// Store-assigned id; called once on insert.
    fn assign_id(&mut self, id: Self::Id);
}
