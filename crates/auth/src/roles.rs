use core::str::FromStr;

use serde::{Deserialize, Serialize};

use backoffice_core::DomainError;

/// Privilege tier of a user.
///
/// A closed set with an explicit ordinal table: policy code compares
/// ordinals, never labels. `MASTER` strictly dominates every other tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    TeamLead,
    Admin,
    Master,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 4] = [Role::User, Role::TeamLead, Role::Admin, Role::Master];

    pub const fn ordinal(self) -> u8 {
        match self {
            Role::User => 0,
            Role::TeamLead => 1,
            Role::Admin => 2,
            Role::Master => 3,
        }
    }

    /// True when this role is at least as privileged as `minimum`.
    pub const fn dominates(self, minimum: Role) -> bool {
        self.ordinal() >= minimum.ordinal()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::TeamLead => "TEAM_LEAD",
            Role::Admin => "ADMIN",
            Role::Master => "MASTER",
        }
    }

    /// Display label used by the admin UI.
    pub const fn label(&self) -> &'static str {
        match self {
            Role::User => "일반",
            Role::TeamLead => "팀장",
            Role::Admin => "관리자",
            Role::Master => "마스터",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::invalid_option("role", wanted))
    }
}
