//! Authorization policy engine.
//!
//! Two predicates decide every request:
//!
//! - [`require_role`]: the caller's role ordinal must reach a minimum.
//! - [`require_self_or_role`]: the caller acts on their own record, or passes
//!   `require_role`.
//!
//! [`Operation::requirement`] is the single policy table mapping each
//! operation to exactly one predicate. Services call [`authorize`] before
//! touching a store, so a denial never leaves partial writes behind.

use core::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use backoffice_core::{DomainError, UserId};

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("requires role {required} or higher (caller is {actual})")]
    InsufficientRole { required: Role, actual: Role },

    #[error("may only act on own record {caller} unless role {required} or higher (target {target})")]
    NotSelf {
        caller: UserId,
        target: UserId,
        required: Role,
    },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::forbidden(value.to_string())
    }
}

/// Allow iff `principal.role` dominates `minimum`.
pub fn require_role(principal: &Principal, minimum: Role) -> Result<(), AuthzError> {
    if principal.role.dominates(minimum) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: minimum,
            actual: principal.role,
        })
    }
}

/// Allow iff the principal is `target`, or `require_role` holds.
pub fn require_self_or_role(principal: &Principal, target: UserId, minimum: Role) -> Result<(), AuthzError> {
    if principal.is_self(target) || principal.role.dominates(minimum) {
        Ok(())
    } else {
        Err(AuthzError::NotSelf {
            caller: principal.id,
            target,
            required: minimum,
        })
    }
}

/// Predicate attached to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "minimum", rename_all = "snake_case")]
pub enum Requirement {
    Role(Role),
    SelfOrRole(Role),
}

/// Every guarded operation the backoffice exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListPending,
    Approve,
    Reject,
    ListUsers,
    SetStatus,
    SetRole,
    SetLevel,
    ViewProfile,
    UpdateProfile,
    /// Read/write access to a user's memos and calendar events.
    ManagePlanner,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::ListPending,
        Operation::Approve,
        Operation::Reject,
        Operation::ListUsers,
        Operation::SetStatus,
        Operation::SetRole,
        Operation::SetLevel,
        Operation::ViewProfile,
        Operation::UpdateProfile,
        Operation::ManagePlanner,
    ];

    pub const fn requirement(self) -> Requirement {
        match self {
            Operation::ListPending | Operation::Approve | Operation::Reject => Requirement::Role(Role::Admin),
            Operation::ListUsers => Requirement::Role(Role::TeamLead),
            Operation::SetStatus | Operation::SetRole | Operation::SetLevel => Requirement::Role(Role::Master),
            Operation::ViewProfile | Operation::UpdateProfile | Operation::ManagePlanner => {
                Requirement::SelfOrRole(Role::Master)
            }
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::ListPending => "list_pending",
            Operation::Approve => "approve",
            Operation::Reject => "reject",
            Operation::ListUsers => "list_users",
            Operation::SetStatus => "set_status",
            Operation::SetRole => "set_role",
            Operation::SetLevel => "set_level",
            Operation::ViewProfile => "view_profile",
            Operation::UpdateProfile => "update_profile",
            Operation::ManagePlanner => "manage_planner",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::invalid_option("operation", wanted))
    }
}

/// Apply the policy for `operation`.
///
/// `target` is the user the operation acts on. Self-or-role operations
/// without a target are treated as acting on the caller.
pub fn authorize(principal: &Principal, operation: Operation, target: Option<UserId>) -> Result<(), AuthzError> {
    let result = match operation.requirement() {
        Requirement::Role(minimum) => require_role(principal, minimum),
        Requirement::SelfOrRole(minimum) => {
            require_self_or_role(principal, target.unwrap_or(principal.id), minimum)
        }
    };

    if let Err(e) = &result {
        tracing::debug!(
            caller = %principal.id,
            role = %principal.role,
            operation = %operation,
            reason = %e,
            "authorization denied"
        );
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Answers "why was this request allowed/denied?" without performing it.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub operation: Operation,
    pub requirement: Requirement,
    pub caller_id: UserId,
    pub caller_role: Role,
    pub target_id: Option<UserId>,
    pub granted: bool,
    pub reason: String,
    /// Roles that would pass the role part of the requirement.
    pub sufficient_roles: Vec<Role>,
}

pub fn explain(principal: &Principal, operation: Operation, target: Option<UserId>) -> AuthorizationExplanation {
    let requirement = operation.requirement();
    let minimum = match requirement {
        Requirement::Role(r) | Requirement::SelfOrRole(r) => r,
    };
    let sufficient_roles: Vec<Role> = Role::ALL.into_iter().filter(|r| r.dominates(minimum)).collect();

    let outcome = match requirement {
        Requirement::Role(_) => require_role(principal, minimum),
        Requirement::SelfOrRole(_) => require_self_or_role(principal, target.unwrap_or(principal.id), minimum),
    };

    let reason = match (&outcome, requirement) {
        (Ok(()), Requirement::SelfOrRole(_)) if principal.is_self(target.unwrap_or(principal.id)) => {
            "caller is acting on their own record".to_string()
        }
        (Ok(()), _) => format!("caller role {} meets minimum {}", principal.role, minimum),
        (Err(e), _) => e.to_string(),
    };

    AuthorizationExplanation {
        operation,
        requirement,
        caller_id: principal.id,
        caller_role: principal.role,
        target_id: target,
        granted: outcome.is_ok(),
        reason,
        sufficient_roles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn principal(id: i64, role: Role) -> Principal {
        Principal::new(UserId::new(id), role, format!("u{id}@x.com"))
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    #[test]
    fn approval_requires_admin() {
        assert!(authorize(&principal(1, Role::Admin), Operation::Approve, Some(UserId::new(2))).is_ok());
        assert!(authorize(&principal(1, Role::TeamLead), Operation::Approve, Some(UserId::new(2))).is_err());
    }

    #[test]
    fn role_changes_are_master_only() {
        let err = authorize(&principal(1, Role::Admin), Operation::SetRole, Some(UserId::new(2))).unwrap_err();
        assert_eq!(
            err,
            AuthzError::InsufficientRole {
                required: Role::Master,
                actual: Role::Admin
            }
        );
        assert_eq!(DomainError::from(err).code(), "forbidden");
    }

    #[test]
    fn role_operations_ignore_self() {
        // A USER cannot approve themselves even though target == caller.
        let me = principal(5, Role::User);
        assert!(authorize(&me, Operation::Approve, Some(UserId::new(5))).is_err());
    }

    #[test]
    fn profile_access_without_target_means_self() {
        assert!(authorize(&principal(9, Role::User), Operation::ViewProfile, None).is_ok());
    }

    #[test]
    fn explanation_reports_denial() {
        let exp = explain(&principal(3, Role::User), Operation::SetLevel, Some(UserId::new(4)));
        assert!(!exp.granted);
        assert_eq!(exp.sufficient_roles, vec![Role::Master]);
        assert!(exp.reason.contains("MASTER"));
    }

    #[test]
    fn explanation_reports_self_access() {
        let exp = explain(&principal(3, Role::User), Operation::UpdateProfile, Some(UserId::new(3)));
        assert!(exp.granted);
        assert_eq!(exp.reason, "caller is acting on their own record");
    }

    #[test]
    fn operation_names_round_trip_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert!("delete_everything".parse::<Operation>().is_err());
    }

    proptest! {
        /// Property: privilege is monotone. Whatever requires r2 is denied to
        /// any r1 below it and granted to r2 itself.
        #[test]
        fn require_role_is_monotone(r1 in any_role(), r2 in any_role()) {
            let caller = principal(1, r1);
            let granted = require_role(&caller, r2).is_ok();
            prop_assert_eq!(granted, r1.ordinal() >= r2.ordinal());
            prop_assert!(require_role(&principal(2, r2), r2).is_ok());
        }

        /// Property: acting on self always passes; acting on others passes
        /// iff the role check does.
        #[test]
        fn self_or_role(caller_role in any_role(), minimum in any_role(), caller in 1i64..50, target in 1i64..50) {
            let p = principal(caller, caller_role);
            let result = require_self_or_role(&p, UserId::new(target), minimum);
            if caller == target {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result.is_ok(), require_role(&p, minimum).is_ok());
            }
        }
    }
}
