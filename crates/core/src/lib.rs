//! `backoffice-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy every layer converts into, and the
//! aggregate/entity traits the domain crates implement.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::{Entity, Owned};
pub use error::{DomainError, DomainResult};
pub use id::{EventId, MemoId, UserId};
