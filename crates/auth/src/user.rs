//! User record and its lifecycle state machine.
//!
//! A record is created by signup in `PENDING`/`USER`, and from then on only
//! changes through [`UserCommand`]s: `handle` decides (pure, may fail),
//! `apply` evolves state. Persisting the result is the caller's job.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use backoffice_core::{Aggregate, AggregateRoot, DomainError, DomainResult, UserId};

use crate::{Role, UserStatus, directory::Directory, directory::Level};

static MOBILE_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{4}-\d{4}$").expect("mobile phone pattern"));

static OFFICE_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2,3}-\d{3,4}-\d{4}$").expect("office phone pattern"));

// ─────────────────────────────────────────────────────────────────────────────
// User Record
// ─────────────────────────────────────────────────────────────────────────────

/// A stored user account.
///
/// # Invariants
/// - `id` and `email` never change after creation.
/// - Exactly one `role` and one `status` at all times.
/// - `status` only moves along the edges of [`UserStatus::can_transition_to`].
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub team: Option<String>,
    pub department: Option<String>,
    pub level: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub office_phone_number: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl core::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("name", &self.name)
            .field("team", &self.team)
            .field("department", &self.department)
            .field("level", &self.level)
            .field("role", &self.role)
            .field("status", &self.status)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl UserRecord {
    /// Gate a login attempt on account status.
    ///
    /// Callers must run the password comparison *before* calling this, for
    /// every account, so that timing does not depend on status.
    pub fn check_login(&self, password_matches: bool) -> DomainResult<()> {
        match self.status {
            UserStatus::Pending => Err(DomainError::AccountPending),
            UserStatus::Suspended => Err(DomainError::AccountSuspended),
            UserStatus::Active if password_matches => Ok(()),
            UserStatus::Active => Err(DomainError::InvalidCredentials),
        }
    }
}

impl AggregateRoot for UserRecord {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Fields of a record that does not exist yet; the store assigns the id.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub team: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub role: Role,
    pub status: UserStatus,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("team", &self.team)
            .field("role", &self.role)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl NewUser {
    /// A self-service signup: always `PENDING` with role `USER`.
    pub fn pending(profile: SignupProfile, password_hash: String) -> Self {
        Self {
            email: profile.email,
            password_hash,
            name: profile.name,
            team: profile.team,
            department: profile.department,
            phone_number: profile.phone_number,
            birth_date: profile.birth_date,
            role: Role::User,
            status: UserStatus::Pending,
        }
    }

    /// The bootstrap master account: active from the start.
    pub fn master(email: &str, name: &str, password_hash: String) -> DomainResult<Self> {
        Ok(Self {
            email: normalize_email(email)?,
            password_hash,
            name: required("name", name)?,
            team: None,
            department: None,
            phone_number: None,
            birth_date: None,
            role: Role::Master,
            status: UserStatus::Active,
        })
    }

    pub fn into_record(self, id: UserId, now: DateTime<Utc>) -> UserRecord {
        UserRecord {
            id,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            team: self.team,
            department: self.department,
            level: None,
            phone_number: self.phone_number,
            birth_date: self.birth_date,
            office_phone_number: None,
            role: self.role,
            status: self.status,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Signup
// ─────────────────────────────────────────────────────────────────────────────

/// Raw signup input.
#[derive(Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub name: String,
    pub team: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Signup input after validation (password excluded: it is hashed separately).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupProfile {
    pub email: String,
    pub name: String,
    pub team: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl SignupForm {
    pub fn validate(&self, directory: &Directory) -> DomainResult<SignupProfile> {
        let email = normalize_email(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        let name = required("name", &self.name)?;

        let team = non_blank(self.team.as_deref());
        let department = match &team {
            Some(team) => Some(directory.department_for(team)?.to_string()),
            None => None,
        };

        let phone_number = non_blank(self.phone_number.as_deref());
        if let Some(phone) = &phone_number {
            check_mobile_phone(phone)?;
        }

        Ok(SignupProfile {
            email,
            name,
            team,
            department,
            phone_number,
            birth_date: self.birth_date,
        })
    }
}

/// Trim + lowercase, and require `local@domain`.
pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(email),
        _ => Err(DomainError::validation("invalid email format")),
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn check_mobile_phone(phone: &str) -> DomainResult<()> {
    if MOBILE_PHONE.is_match(phone) {
        Ok(())
    } else {
        Err(DomainError::validation("phone number must look like 010-1234-5678"))
    }
}

fn check_office_phone(phone: &str) -> DomainResult<()> {
    if OFFICE_PHONE.is_match(phone) {
        Ok(())
    } else {
        Err(DomainError::validation("office phone number must look like 02-1234-5678 or 02-123-4567"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Self-service profile edits. `Some(None)` clears a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub phone_number: Option<Option<String>>,
    pub office_phone_number: Option<Option<String>>,
    pub birth_date: Option<Option<NaiveDate>>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.phone_number.is_none() && self.office_phone_number.is_none() && self.birth_date.is_none()
    }

    fn validate(&self) -> DomainResult<()> {
        if let Some(Some(phone)) = &self.phone_number {
            check_mobile_phone(phone)?;
        }
        if let Some(Some(phone)) = &self.office_phone_number {
            check_office_phone(phone)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// PENDING -> ACTIVE.
    Approve,
    /// PENDING -> SUSPENDED.
    Reject,
    SetStatus(UserStatus),
    SetRole(Role),
    SetLevel(Level),
    UpdateProfile(ProfileChanges),
    ChangePassword { password_hash: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    StatusChanged { from: UserStatus, to: UserStatus },
    RoleChanged { from: Role, to: Role },
    LevelChanged { from: Option<String>, to: String },
    ProfileUpdated(ProfileChanges),
    PasswordChanged { password_hash: String },
}

impl UserEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            UserEvent::StatusChanged { .. } => "user.status_changed",
            UserEvent::RoleChanged { .. } => "user.role_changed",
            UserEvent::LevelChanged { .. } => "user.level_changed",
            UserEvent::ProfileUpdated(_) => "user.profile_updated",
            UserEvent::PasswordChanged { .. } => "user.password_changed",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate Implementation
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for UserRecord {
    type Command = UserCommand;
    type Event = UserEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            UserEvent::StatusChanged { to, .. } => self.status = *to,
            UserEvent::RoleChanged { to, .. } => self.role = *to,
            UserEvent::LevelChanged { to, .. } => self.level = Some(to.clone()),
            UserEvent::ProfileUpdated(changes) => self.apply_profile(changes),
            UserEvent::PasswordChanged { password_hash } => self.password_hash = password_hash.clone(),
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            UserCommand::Approve => self.handle_decision(UserStatus::Active),
            UserCommand::Reject => self.handle_decision(UserStatus::Suspended),
            UserCommand::SetStatus(next) => self.handle_set_status(*next),
            UserCommand::SetRole(role) => Ok(self.handle_set_role(*role)),
            UserCommand::SetLevel(level) => Ok(self.handle_set_level(level)),
            UserCommand::UpdateProfile(changes) => {
                if changes.is_empty() {
                    return Err(DomainError::validation("no profile fields to update"));
                }
                changes.validate()?;
                Ok(vec![UserEvent::ProfileUpdated(changes.clone())])
            }
            UserCommand::ChangePassword { password_hash } => Ok(vec![UserEvent::PasswordChanged {
                password_hash: password_hash.clone(),
            }]),
        }
    }
}

impl UserRecord {
    // ─────────────────────────────────────────────────────────────────────────
    // Command Handlers
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_decision(&self, to: UserStatus) -> DomainResult<Vec<UserEvent>> {
        if self.status != UserStatus::Pending {
            return Err(DomainError::already_processed(self.status));
        }
        Ok(vec![UserEvent::StatusChanged { from: self.status, to }])
    }

    fn handle_set_status(&self, next: UserStatus) -> DomainResult<Vec<UserEvent>> {
        if next == self.status {
            return Ok(vec![]);
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_option("status", next.as_str()));
        }
        Ok(vec![UserEvent::StatusChanged {
            from: self.status,
            to: next,
        }])
    }

    fn handle_set_role(&self, role: Role) -> Vec<UserEvent> {
        if role == self.role {
            return vec![];
        }
        vec![UserEvent::RoleChanged { from: self.role, to: role }]
    }

    fn handle_set_level(&self, level: &Level) -> Vec<UserEvent> {
        if self.level.as_deref() == Some(level.as_str()) {
            return vec![];
        }
        vec![UserEvent::LevelChanged {
            from: self.level.clone(),
            to: level.as_str().to_string(),
        }]
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Appliers
    // ─────────────────────────────────────────────────────────────────────────

    fn apply_profile(&mut self, changes: &ProfileChanges) {
        if let Some(phone) = &changes.phone_number {
            self.phone_number = phone.clone();
        }
        if let Some(phone) = &changes.office_phone_number {
            self.office_phone_number = phone.clone();
        }
        if let Some(date) = changes.birth_date {
            self.birth_date = date;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signup_form(email: &str) -> SignupForm {
        SignupForm {
            email: email.to_string(),
            password: "p1".to_string(),
            name: "A".to_string(),
            team: Some("1팀".to_string()),
            ..Default::default()
        }
    }

    fn record(status: UserStatus) -> UserRecord {
        let profile = signup_form("a@x.com").validate(&Directory::default()).unwrap();
        let mut user = NewUser::pending(profile, "hash".to_string()).into_record(UserId::new(1), Utc::now());
        user.status = status;
        user
    }

    #[test]
    fn signup_creates_pending_user_with_department() {
        let profile = signup_form("  A@X.com ").validate(&Directory::default()).unwrap();
        let user = NewUser::pending(profile, "hash".to_string());

        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.status, UserStatus::Pending);
        assert_eq!(user.role, Role::User);
        assert_eq!(user.department.as_deref(), Some("영업1본부"));
    }

    #[test]
    fn signup_requires_fields() {
        let dir = Directory::default();

        let mut form = signup_form("not-an-email");
        assert_eq!(form.validate(&dir).unwrap_err().code(), "validation_failed");

        form = signup_form("a@x.com");
        form.password.clear();
        assert_eq!(form.validate(&dir).unwrap_err().code(), "validation_failed");

        form = signup_form("a@x.com");
        form.name = "   ".to_string();
        assert_eq!(form.validate(&dir).unwrap_err().code(), "validation_failed");
    }

    #[test]
    fn signup_with_unknown_team_is_invalid_option() {
        let mut form = signup_form("a@x.com");
        form.team = Some("9팀".to_string());
        assert_eq!(
            form.validate(&Directory::default()).unwrap_err(),
            DomainError::invalid_option("team", "9팀")
        );
    }

    #[test]
    fn approve_pending_activates() {
        let mut user = record(UserStatus::Pending);
        let events = user.execute(&UserCommand::Approve).unwrap();

        assert_eq!(
            events,
            vec![UserEvent::StatusChanged {
                from: UserStatus::Pending,
                to: UserStatus::Active
            }]
        );
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.version, 1);
    }

    #[test]
    fn reject_pending_suspends() {
        let mut user = record(UserStatus::Pending);
        user.execute(&UserCommand::Reject).unwrap();
        assert_eq!(user.status, UserStatus::Suspended);
    }

    #[test]
    fn decisions_on_processed_records_fail_without_change() {
        for status in [UserStatus::Active, UserStatus::Suspended] {
            for cmd in [UserCommand::Approve, UserCommand::Reject] {
                let user = record(status);
                let err = user.handle(&cmd).unwrap_err();
                assert_eq!(err, DomainError::already_processed(status));
                assert_eq!(user.status, status);
            }
        }
    }

    #[test]
    fn set_status_follows_edges() {
        let mut user = record(UserStatus::Suspended);
        user.execute(&UserCommand::SetStatus(UserStatus::Active)).unwrap();
        assert_eq!(user.status, UserStatus::Active);

        // Re-affirming is a no-op.
        assert!(user.handle(&UserCommand::SetStatus(UserStatus::Active)).unwrap().is_empty());

        let err = user.handle(&UserCommand::SetStatus(UserStatus::Pending)).unwrap_err();
        assert_eq!(err, DomainError::invalid_option("status", "PENDING"));
    }

    #[test]
    fn set_role_and_level() {
        let dir = Directory::default();
        let mut user = record(UserStatus::Active);

        user.execute(&UserCommand::SetRole(Role::TeamLead)).unwrap();
        user.execute(&UserCommand::SetLevel(dir.level("대리").unwrap())).unwrap();

        assert_eq!(user.role, Role::TeamLead);
        assert_eq!(user.level.as_deref(), Some("대리"));
        assert!(user.handle(&UserCommand::SetRole(Role::TeamLead)).unwrap().is_empty());
    }

    #[test]
    fn profile_update_validates_phone_formats() {
        let mut user = record(UserStatus::Active);

        let bad = ProfileChanges {
            office_phone_number: Some(Some("12345".to_string())),
            ..Default::default()
        };
        assert_eq!(
            user.handle(&UserCommand::UpdateProfile(bad)).unwrap_err().code(),
            "validation_failed"
        );

        let good = ProfileChanges {
            phone_number: Some(Some("010-1234-5678".to_string())),
            office_phone_number: Some(Some("02-123-4567".to_string())),
            birth_date: Some(NaiveDate::from_ymd_opt(1990, 5, 1)),
        };
        user.execute(&UserCommand::UpdateProfile(good)).unwrap();
        assert_eq!(user.phone_number.as_deref(), Some("010-1234-5678"));
        assert_eq!(user.office_phone_number.as_deref(), Some("02-123-4567"));

        let clear = ProfileChanges {
            office_phone_number: Some(None),
            ..Default::default()
        };
        user.execute(&UserCommand::UpdateProfile(clear)).unwrap();
        assert_eq!(user.office_phone_number, None);
        assert_eq!(user.phone_number.as_deref(), Some("010-1234-5678"));
    }

    #[test]
    fn empty_profile_update_is_rejected() {
        let user = record(UserStatus::Active);
        assert!(user.handle(&UserCommand::UpdateProfile(ProfileChanges::default())).is_err());
    }

    #[test]
    fn login_gate() {
        assert_eq!(record(UserStatus::Active).check_login(true), Ok(()));
        assert_eq!(
            record(UserStatus::Active).check_login(false),
            Err(DomainError::InvalidCredentials)
        );
        for matches in [true, false] {
            assert_eq!(
                record(UserStatus::Pending).check_login(matches),
                Err(DomainError::AccountPending)
            );
            assert_eq!(
                record(UserStatus::Suspended).check_login(matches),
                Err(DomainError::AccountSuspended)
            );
        }
    }

    #[test]
    fn debug_redacts_password_hash() {
        let rendered = format!("{:?}", record(UserStatus::Active));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"hash\""));
    }

    fn any_status() -> impl Strategy<Value = UserStatus> {
        prop::sample::select(UserStatus::ALL.to_vec())
    }

    fn any_command() -> impl Strategy<Value = UserCommand> {
        prop_oneof![
            Just(UserCommand::Approve),
            Just(UserCommand::Reject),
            any_status().prop_map(UserCommand::SetStatus),
            prop::sample::select(Role::ALL.to_vec()).prop_map(UserCommand::SetRole),
        ]
    }

    proptest! {
        /// Property: whatever sequence of commands is attempted, the status
        /// only ever moves along defined edges and never returns to PENDING.
        #[test]
        fn status_only_moves_along_edges(cmds in prop::collection::vec(any_command(), 1..20)) {
            let mut user = record(UserStatus::Pending);
            for cmd in cmds {
                let before = user.status;
                let outcome = user.execute(&cmd);
                let after = user.status;
                if outcome.is_err() {
                    prop_assert_eq!(before, after);
                }
                if before != after {
                    prop_assert!(before.can_transition_to(after));
                    prop_assert_ne!(after, UserStatus::Pending);
                }
            }
        }
    }
}
