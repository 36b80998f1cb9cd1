//! Per-request authentication context

use std::collections::BTreeSet;

use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    username: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new(user_id: UserId, username: impl Into<String>, roles: BTreeSet<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::new(user.id(), user.username(), user.roles())
    }
}

/// Built once per request and handed explicitly to every service call.
/// Anonymous unless a valid access token was presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// The principal, or `Unauthenticated`
    pub fn require_principal(&self) -> Result<&Principal, DomainError> {
        self.principal.as_ref().ok_or(DomainError::Unauthenticated)
    }

    pub fn clear(&mut self) {
        self.principal = None;
    }
}
