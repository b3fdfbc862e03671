use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use backoffice_auth::{ProfileChanges, Role, SignupForm, UserRecord, UserStatus};
use backoffice_core::{DomainError, DomainResult, UserId};
use backoffice_infra::{ProfileUpdate, Session};

// ─────────────────────────────────────────────────────────────────────────────
// Request DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub team: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl From<SignupRequest> for SignupForm {
    fn from(value: SignupRequest) -> Self {
        SignupForm {
            email: value.email,
            password: value.password,
            name: value.name,
            team: value.team,
            phone_number: value.phone_number,
            birth_date: value.birth_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// PATCH body for a profile. Absent fields are untouched, `null` clears.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// Present only to be refused: email cannot change after signup.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub office_phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birth_date: Option<Option<NaiveDate>>,
}

impl UpdateProfileRequest {
    pub fn into_update(self) -> DomainResult<ProfileUpdate> {
        if self.email.is_some() {
            return Err(DomainError::validation("email cannot be changed"));
        }
        Ok(ProfileUpdate {
            changes: ProfileChanges {
                phone_number: self.phone_number.map(blank_to_none),
                office_phone_number: self.office_phone_number.map(blank_to_none),
                birth_date: self.birth_date,
            },
            new_password: self.password,
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct OfficePhoneRequest {
    pub office_phone_number: Option<String>,
}

impl OfficePhoneRequest {
    pub fn into_phone(self) -> Option<String> {
        blank_to_none(self.office_phone_number)
    }
}

/// Option values arrive as strings so unknown values become `invalid_option`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SetLevelRequest {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct MemoRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    pub owner: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventListQuery {
    pub owner: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl EventListQuery {
    pub fn window(&self) -> DomainResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        match (self.from, self.to) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) if from < to => Ok(Some((from, to))),
            (Some(_), Some(_)) => Err(DomainError::validation("'from' must be before 'to'")),
            _ => Err(DomainError::validation("'from' and 'to' must be given together")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub operation: String,
    pub target: Option<i64>,
}

pub fn owner_id(raw: Option<i64>) -> Option<UserId> {
    raw.map(UserId::new)
}

// ─────────────────────────────────────────────────────────────────────────────
// Response DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// A user as clients see it. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub team: Option<String>,
    pub department: Option<String>,
    pub level: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub office_phone_number: Option<String>,
    pub role: Role,
    pub role_label: &'static str,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            team: user.team.clone(),
            department: user.department.clone(),
            level: user.level.clone(),
            phone_number: user.phone_number.clone(),
            birth_date: user.birth_date,
            office_phone_number: user.office_phone_number.clone(),
            role: user.role,
            role_label: user.role.label(),
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<UserRecord> for UserView {
    fn from(user: UserRecord) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            token_type: "Bearer",
            expires_at: session.expires_at,
            user: UserView::from(&session.user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> Items<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_clears_and_absent_keeps() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"office_phone_number": null, "phone_number": "010-1111-2222"}"#).unwrap();
        let update = req.into_update().unwrap();
        assert_eq!(update.changes.office_phone_number, Some(None));
        assert_eq!(update.changes.phone_number, Some(Some("010-1111-2222".to_string())));
        assert_eq!(update.changes.birth_date, None);
        assert!(update.new_password.is_none());
    }

    #[test]
    fn email_change_is_refused() {
        let req: UpdateProfileRequest = serde_json::from_str(r#"{"email": "new@x.com"}"#).unwrap();
        assert_eq!(req.into_update().unwrap_err().code(), "validation_failed");
    }

    #[test]
    fn event_window_needs_both_bounds() {
        let q = EventListQuery {
            from: Some(Utc::now()),
            ..Default::default()
        };
        assert!(q.window().is_err());
        assert_eq!(EventListQuery::default().window().unwrap(), None);
    }
}
