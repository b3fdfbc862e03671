use backoffice_auth::{Principal, Role, SessionClaims};
use backoffice_core::UserId;

/// Authenticated caller for a request, inserted by the auth middleware.
///
/// Immutable for the lifetime of the request; handlers never see a request
/// without one on protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    claims: SessionClaims,
}

impl PrincipalContext {
    pub fn new(claims: SessionClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> UserId {
        self.claims.id
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }

    pub fn principal(&self) -> Principal {
        Principal::from(&self.claims)
    }
}
