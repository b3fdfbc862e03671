//! Infrastructure layer: record stores and the application services that
//! compose policy, state machine and store.

pub mod accounts;
pub mod planner;
pub mod seed;
pub mod store;

pub use accounts::{AccountService, ProfileUpdate, Session};
pub use planner::PlannerService;
pub use seed::{MasterSeed, SeedOutcome, ensure_master};
pub use store::{Expected, InMemoryOwnedStore, InMemoryUserStore, OwnedStore, StoreError, UserFilter, UserStore};
