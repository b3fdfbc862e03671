use serde::Serialize;

use backoffice_core::UserId;

use crate::{Role, claims::SessionClaims};

/// Identity of an authenticated caller, as far as policy decisions care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub email: String,
}

impl Principal {
    pub fn new(id: UserId, role: Role, email: impl Into<String>) -> Self {
        Self {
            id,
            role,
            email: email.into(),
        }
    }

    pub fn is_self(&self, target: UserId) -> bool {
        self.id == target
    }
}

impl From<&SessionClaims> for Principal {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            id: claims.id,
            role: claims.role,
            email: claims.email.clone(),
        }
    }
}
