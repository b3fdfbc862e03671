//! Account application service.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! principal + request
//!   -> policy predicate for the operation (Forbidden stops here, nothing written)
//!   -> load record from the store
//!   -> UserRecord::execute(command) (pure state machine)
//!   -> conditional write: update only if status and version are still the ones we read
//! ```
//!
//! Of two callers that both read PENDING, only one approve/reject lands; the
//! other surfaces as `AlreadyProcessed`. Any other write racing a change it
//! did not see surfaces as `Conflict`.
//!
//! Option values (status, role, level) arrive as raw strings and are parsed
//! after the policy check, so a caller below the threshold sees `Forbidden`
//! whatever it sent.
//!
//! Methods are synchronous. Callers on an async runtime should run
//! `signup`, `login` and password changes on a blocking thread, since the
//! credential verifier is CPU-bound.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use backoffice_auth::{
    CredentialVerifier, Directory, NewUser, Operation, Principal, ProfileChanges, Role, SessionClaims,
    SignupForm, TokenCodec, UserCommand, UserRecord, UserStatus, authorize, user::normalize_email,
    validate_new_password,
};
use backoffice_core::{Aggregate, DomainError, DomainResult, UserId};

use crate::store::{Expected, UserFilter, UserStore};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserRecord,
}

/// Self-service profile edit. Email is not editable.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub changes: ProfileChanges,
    /// Plaintext; checked against the password policy, then re-hashed.
    pub new_password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.new_password.is_none()
    }
}

#[derive(Debug)]
pub struct AccountService<S, V, T> {
    store: S,
    verifier: V,
    tokens: T,
    directory: Directory,
}

impl<S, V, T> AccountService<S, V, T> {
    pub fn new(store: S, verifier: V, tokens: T, directory: Directory) -> Self {
        Self {
            store,
            verifier,
            tokens,
            directory,
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, V, T> AccountService<S, V, T>
where
    S: UserStore,
    V: CredentialVerifier,
    T: TokenCodec,
{
    // ─────────────────────────────────────────────────────────────────────────
    // Public flows
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new account in `PENDING` with role `USER`.
    pub fn signup(&self, form: &SignupForm) -> DomainResult<UserRecord> {
        let profile = form.validate(&self.directory)?;
        if self.store.find_by_email(&profile.email)?.is_some() {
            return Err(DomainError::duplicate_email(profile.email));
        }

        let hash = self.verifier.hash(&form.password)?;
        let user = self.store.create(NewUser::pending(profile, hash))?;

        info!(user_id = %user.id, team = ?user.team, "signup registered, awaiting approval");
        Ok(user)
    }

    /// Check credentials and issue a session token.
    ///
    /// The password comparison always runs, against a dummy hash when the
    /// email is unknown. Only then is the account status inspected.
    pub fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> DomainResult<Session> {
        let user = match normalize_email(email) {
            Ok(email) => self.store.find_by_email(&email)?,
            Err(_) => None,
        };
        let matches = self
            .verifier
            .compare_or_dummy(password, user.as_ref().map(|u| u.password_hash.as_str()));

        let Some(user) = user else {
            return Err(DomainError::InvalidCredentials);
        };
        if let Err(e) = user.check_login(matches) {
            warn!(user_id = %user.id, status = %user.status, code = e.code(), "login refused");
            return Err(e);
        }

        let claims = SessionClaims::for_user(&user, now, self.tokens.ttl());
        let token = self.tokens.issue(&claims)?;
        let expires_at = now + self.tokens.ttl();

        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(Session {
            token,
            expires_at,
            user,
        })
    }

    /// Verify a bearer token and return the caller it identifies.
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> DomainResult<SessionClaims> {
        Ok(self.tokens.verify(token, now)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn list_pending(&self, principal: &Principal) -> DomainResult<Vec<UserRecord>> {
        authorize(principal, Operation::ListPending, None)?;
        Ok(self.store.list(&UserFilter::pending())?)
    }

    pub fn list_users(&self, principal: &Principal, filter: &UserFilter) -> DomainResult<Vec<UserRecord>> {
        authorize(principal, Operation::ListUsers, None)?;
        Ok(self.store.list(filter)?)
    }

    pub fn get_profile(&self, principal: &Principal, id: UserId) -> DomainResult<UserRecord> {
        authorize(principal, Operation::ViewProfile, Some(id))?;
        self.load(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administrative transitions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn approve(&self, principal: &Principal, id: UserId, now: DateTime<Utc>) -> DomainResult<UserRecord> {
        authorize(principal, Operation::Approve, Some(id))?;
        self.transition(principal, Operation::Approve, id, &UserCommand::Approve, now)
    }

    pub fn reject(&self, principal: &Principal, id: UserId, now: DateTime<Utc>) -> DomainResult<UserRecord> {
        authorize(principal, Operation::Reject, Some(id))?;
        self.transition(principal, Operation::Reject, id, &UserCommand::Reject, now)
    }

    /// `status` is a canonical status name, e.g. `"SUSPENDED"`.
    pub fn set_status(&self, principal: &Principal, id: UserId, status: &str, now: DateTime<Utc>) -> DomainResult<UserRecord> {
        authorize(principal, Operation::SetStatus, Some(id))?;
        let status: UserStatus = status.parse()?;
        self.transition(principal, Operation::SetStatus, id, &UserCommand::SetStatus(status), now)
    }

    pub fn set_role(&self, principal: &Principal, id: UserId, role: &str, now: DateTime<Utc>) -> DomainResult<UserRecord> {
        authorize(principal, Operation::SetRole, Some(id))?;
        let role: Role = role.parse()?;
        self.transition(principal, Operation::SetRole, id, &UserCommand::SetRole(role), now)
    }

    /// `level` is resolved against the directory.
    pub fn set_level(&self, principal: &Principal, id: UserId, level: &str, now: DateTime<Utc>) -> DomainResult<UserRecord> {
        authorize(principal, Operation::SetLevel, Some(id))?;
        let level = self.directory.level(level)?;
        self.transition(principal, Operation::SetLevel, id, &UserCommand::SetLevel(level), now)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Self-service
    // ─────────────────────────────────────────────────────────────────────────

    pub fn update_profile(
        &self,
        principal: &Principal,
        id: UserId,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<UserRecord> {
        authorize(principal, Operation::UpdateProfile, Some(id))?;
        if update.is_empty() {
            return Err(DomainError::validation("no profile fields to update"));
        }

        let password_changed = update.new_password.is_some();
        let mut commands = Vec::with_capacity(2);
        if !update.changes.is_empty() {
            commands.push(UserCommand::UpdateProfile(update.changes));
        }
        if let Some(password) = update.new_password.as_deref() {
            validate_new_password(password)?;
            commands.push(UserCommand::ChangePassword {
                password_hash: self.verifier.hash(password)?,
            });
        }

        let mut user = self.load(id)?;
        let expected = Expected::of(&user);
        for command in &commands {
            user.execute(command)?;
        }
        self.persist(expected, &mut user, now)?;

        info!(user_id = %id, caller = %principal.id, password_changed, "profile updated");
        Ok(user)
    }

    /// Set or clear the office phone number only.
    pub fn set_office_phone(
        &self,
        principal: &Principal,
        id: UserId,
        phone: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<UserRecord> {
        let update = ProfileUpdate {
            changes: ProfileChanges {
                office_phone_number: Some(phone),
                ..ProfileChanges::default()
            },
            new_password: None,
        };
        self.update_profile(principal, id, update, now)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn load(&self, id: UserId) -> DomainResult<UserRecord> {
        self.store.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    /// Load, execute, write back. The caller has already authorized `operation`.
    fn transition(
        &self,
        principal: &Principal,
        operation: Operation,
        id: UserId,
        command: &UserCommand,
        now: DateTime<Utc>,
    ) -> DomainResult<UserRecord> {
        let mut user = self.load(id)?;
        let expected = Expected::of(&user);
        let events = user.execute(command)?;
        if events.is_empty() {
            return Ok(user);
        }
        self.persist(expected, &mut user, now)?;

        for event in &events {
            info!(
                user_id = %id,
                caller = %principal.id,
                operation = %operation,
                event = event.event_type(),
                status = %user.status,
                role = %user.role,
                "user record changed"
            );
        }
        Ok(user)
    }

    /// Write back only if nobody else wrote since `expected` was taken.
    fn persist(&self, expected: Expected, user: &mut UserRecord, now: DateTime<Utc>) -> DomainResult<()> {
        user.updated_at = now;
        self.store.update_if_unchanged(expected, user)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::InMemoryUserStore;
    use backoffice_auth::{Argon2Verifier, Hs256TokenCodec, token::default_ttl};

    type Service = AccountService<Arc<InMemoryUserStore>, Argon2Verifier, Hs256TokenCodec>;

    fn service() -> Service {
        AccountService::new(
            InMemoryUserStore::arc(),
            Argon2Verifier::new().unwrap(),
            Hs256TokenCodec::new(b"test-secret", default_ttl()).unwrap(),
            Directory::default(),
        )
    }

    fn form(email: &str, password: &str) -> SignupForm {
        SignupForm {
            email: email.to_string(),
            password: password.to_string(),
            name: "A".to_string(),
            team: Some("1팀".to_string()),
            ..Default::default()
        }
    }

    fn admin() -> Principal {
        Principal::new(UserId::new(900), Role::Admin, "admin@x.com")
    }

    fn master() -> Principal {
        Principal::new(UserId::new(901), Role::Master, "master@x.com")
    }

    #[test]
    fn signup_approve_login_scenario() {
        let svc = service();
        let now = Utc::now();

        let user = svc.signup(&form("a@x.com", "p1")).unwrap();
        assert_eq!(user.status, UserStatus::Pending);
        assert_eq!(user.role, Role::User);
        assert_eq!(user.department.as_deref(), Some("영업1본부"));

        let approved = svc.approve(&admin(), user.id, now).unwrap();
        assert_eq!(approved.status, UserStatus::Active);

        let session = svc.login("a@x.com", "p1", now).unwrap();
        let claims = svc.authenticate(&session.token, now).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.role, Role::User);
        assert_eq!(session.expires_at, now + default_ttl());

        assert_eq!(
            svc.login("a@x.com", "wrong", now).unwrap_err(),
            DomainError::InvalidCredentials
        );
    }

    #[test]
    fn duplicate_signup_leaves_original_untouched() {
        let svc = service();
        let first = svc.signup(&form("a@x.com", "p1")).unwrap();

        let err = svc.signup(&form(" A@x.com", "other")).unwrap_err();
        assert_eq!(err, DomainError::duplicate_email("a@x.com"));

        let stored = svc.store().find_by_id(first.id).unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[test]
    fn login_reports_status_before_password() {
        let svc = service();
        let now = Utc::now();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();

        assert_eq!(svc.login("a@x.com", "p1", now).unwrap_err(), DomainError::AccountPending);
        assert_eq!(svc.login("a@x.com", "nope", now).unwrap_err(), DomainError::AccountPending);

        svc.reject(&admin(), user.id, now).unwrap();
        assert_eq!(svc.login("a@x.com", "p1", now).unwrap_err(), DomainError::AccountSuspended);
        assert_eq!(svc.login("a@x.com", "nope", now).unwrap_err(), DomainError::AccountSuspended);
    }

    #[test]
    fn unknown_email_is_invalid_credentials() {
        let svc = service();
        assert_eq!(
            svc.login("ghost@x.com", "p1", Utc::now()).unwrap_err(),
            DomainError::InvalidCredentials
        );
        assert_eq!(
            svc.login("not an email", "p1", Utc::now()).unwrap_err(),
            DomainError::InvalidCredentials
        );
    }

    #[test]
    fn second_decision_is_already_processed() {
        let svc = service();
        let now = Utc::now();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();
        svc.approve(&admin(), user.id, now).unwrap();

        assert!(matches!(
            svc.approve(&admin(), user.id, now),
            Err(DomainError::AlreadyProcessed(_))
        ));
        assert!(matches!(
            svc.reject(&admin(), user.id, now),
            Err(DomainError::AlreadyProcessed(_))
        ));
        assert_eq!(
            svc.store().find_by_id(user.id).unwrap().unwrap().status,
            UserStatus::Active
        );
    }

    #[test]
    fn team_lead_cannot_approve() {
        let svc = service();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();
        let lead = Principal::new(UserId::new(50), Role::TeamLead, "lead@x.com");

        assert!(matches!(
            svc.approve(&lead, user.id, Utc::now()),
            Err(DomainError::Forbidden(_))
        ));
        assert!(svc.list_users(&lead, &UserFilter::default()).is_ok());
        assert!(svc.list_pending(&lead).is_err());
    }

    #[test]
    fn user_cannot_change_roles() {
        let svc = service();
        let now = Utc::now();
        let target = svc.signup(&form("t@x.com", "p1")).unwrap();
        let caller = Principal::new(UserId::new(77), Role::User, "u@x.com");

        let err = svc.set_role(&caller, target.id, "ADMIN", now).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(svc.store().find_by_id(target.id).unwrap().unwrap().role, Role::User);

        // Admin is below the threshold too.
        assert!(svc.set_role(&admin(), target.id, "ADMIN", now).is_err());
        assert_eq!(svc.set_role(&master(), target.id, "admin", now).unwrap().role, Role::Admin);
    }

    #[test]
    fn master_sets_status_and_level() {
        let svc = service();
        let now = Utc::now();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();

        let user = svc.set_status(&master(), user.id, "ACTIVE", now).unwrap();
        let user = svc.set_status(&master(), user.id, "SUSPENDED", now).unwrap();
        let user = svc.set_status(&master(), user.id, "ACTIVE", now).unwrap();
        assert_eq!(user.status, UserStatus::Active);

        assert_eq!(
            svc.set_status(&master(), user.id, "PENDING", now).unwrap_err(),
            DomainError::invalid_option("status", "PENDING")
        );
        assert_eq!(
            svc.set_status(&master(), user.id, "DELETED", now).unwrap_err().code(),
            "invalid_option"
        );

        assert_eq!(svc.set_level(&master(), user.id, "과장", now).unwrap().level.as_deref(), Some("과장"));
        assert_eq!(
            svc.set_level(&master(), user.id, "CEO", now).unwrap_err(),
            DomainError::invalid_option("level", "CEO")
        );
    }

    #[test]
    fn forbidden_option_change_is_reported_before_option_check() {
        let svc = service();
        let now = Utc::now();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();
        assert!(matches!(
            svc.set_level(&admin(), user.id, "CEO", now),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.set_status(&admin(), user.id, "DELETED", now),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.set_role(&admin(), user.id, "OWNER", now),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn profile_is_self_or_master() {
        let svc = service();
        let now = Utc::now();
        let a = svc.signup(&form("a@x.com", "p1")).unwrap();
        let b = svc.signup(&form("b@x.com", "p1")).unwrap();
        let as_a = Principal::new(a.id, Role::User, "a@x.com");

        assert!(svc.get_profile(&as_a, a.id).is_ok());
        assert!(matches!(svc.get_profile(&as_a, b.id), Err(DomainError::Forbidden(_))));
        assert!(svc.get_profile(&master(), b.id).is_ok());
        assert_eq!(svc.get_profile(&master(), UserId::new(404)).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn password_change_enforces_policy_and_rehashes() {
        let svc = service();
        let now = Utc::now();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();
        svc.approve(&admin(), user.id, now).unwrap();
        let me = Principal::new(user.id, Role::User, "a@x.com");

        let weak = ProfileUpdate {
            new_password: Some("short".to_string()),
            ..Default::default()
        };
        assert_eq!(
            svc.update_profile(&me, user.id, weak, now).unwrap_err().code(),
            "validation_failed"
        );

        let strong = ProfileUpdate {
            new_password: Some("longer!pass".to_string()),
            ..Default::default()
        };
        svc.update_profile(&me, user.id, strong, now).unwrap();

        assert_eq!(svc.login("a@x.com", "p1", now).unwrap_err(), DomainError::InvalidCredentials);
        assert!(svc.login("a@x.com", "longer!pass", now).is_ok());
    }

    #[test]
    fn office_phone_can_be_set_and_cleared() {
        let svc = service();
        let now = Utc::now();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();
        let me = Principal::new(user.id, Role::User, "a@x.com");

        let updated = svc.set_office_phone(&me, user.id, Some("02-1234-5678".to_string()), now).unwrap();
        assert_eq!(updated.office_phone_number.as_deref(), Some("02-1234-5678"));

        assert!(svc.set_office_phone(&me, user.id, Some("nope".to_string()), now).is_err());

        let cleared = svc.set_office_phone(&me, user.id, None, now).unwrap();
        assert_eq!(cleared.office_phone_number, None);
    }

    #[test]
    fn stale_profile_write_does_not_revert_role_change() {
        let svc = service();
        let now = Utc::now();
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();
        svc.approve(&admin(), user.id, now).unwrap();

        let mut stale = svc.load(user.id).unwrap();
        let seen = Expected::of(&stale);
        assert_eq!(stale.role, Role::User);

        svc.set_role(&master(), user.id, "ADMIN", now).unwrap();

        let changes = ProfileChanges {
            phone_number: Some(Some("010-1234-5678".to_string())),
            ..ProfileChanges::default()
        };
        stale.execute(&UserCommand::UpdateProfile(changes)).unwrap();
        let err = svc.persist(seen, &mut stale, now).unwrap_err();
        assert_eq!(err.code(), "conflict");

        let stored = svc.store().find_by_id(user.id).unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
        assert_eq!(stored.phone_number, None);
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn concurrent_approvals_have_exactly_one_winner() {
        let svc = Arc::new(service());
        let user = svc.signup(&form("a@x.com", "p1")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = Arc::clone(&svc);
                std::thread::spawn(move || {
                    let caller = Principal::new(UserId::new(1000 + i), Role::Admin, "admin@x.com");
                    if i % 2 == 0 {
                        svc.approve(&caller, user.id, Utc::now())
                    } else {
                        svc.reject(&caller, user.id, Utc::now())
                    }
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        for r in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(r, Err(DomainError::AlreadyProcessed(_))));
        }

        let stored = svc.store().find_by_id(user.id).unwrap().unwrap();
        assert_ne!(stored.status, UserStatus::Pending);
        assert_eq!(stored.version, 1);
    }
}
