use core::str::FromStr;

use serde::{Deserialize, Serialize};

use backoffice_core::DomainError;

/// Workflow state of a user account.
///
/// ```text
/// PENDING   -> ACTIVE | SUSPENDED   (approve / reject)
/// ACTIVE    -> ACTIVE | SUSPENDED
/// SUSPENDED -> ACTIVE               (reinstate)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Signed up, waiting for an administrator decision.
    #[default]
    Pending,
    /// Approved; may log in.
    Active,
    /// Rejected or suspended; may not log in. Not a deletion.
    Suspended,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [UserStatus::Pending, UserStatus::Active, UserStatus::Suspended];

    /// Whether the workflow defines an edge from `self` to `next`.
    pub const fn can_transition_to(self, next: UserStatus) -> bool {
        matches!(
            (self, next),
            (UserStatus::Pending, UserStatus::Active)
                | (UserStatus::Pending, UserStatus::Suspended)
                | (UserStatus::Active, UserStatus::Active)
                | (UserStatus::Active, UserStatus::Suspended)
                | (UserStatus::Suspended, UserStatus::Active)
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "PENDING",
            UserStatus::Active => "ACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        UserStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::invalid_option("status", wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_leads_back_to_pending() {
        for from in UserStatus::ALL {
            assert!(!from.can_transition_to(UserStatus::Pending));
        }
    }

    #[test]
    fn suspended_can_be_reinstated() {
        assert!(UserStatus::Suspended.can_transition_to(UserStatus::Active));
        assert!(!UserStatus::Suspended.can_transition_to(UserStatus::Suspended));
    }

    #[test]
    fn parse_rejects_unknown_status() {
        assert_eq!("active".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert!(matches!(
            "DELETED".parse::<UserStatus>(),
            Err(DomainError::InvalidOption { .. })
        ));
    }
}
