//! Session principal and token claims.

use serde::{Deserialize, Serialize};

use crate::db::{Role, User};

/// Identity derived from a valid session token. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPrincipal {
    pub id: i64,
    pub email: String,
    pub role: Role,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl SessionPrincipal {
    /// Admins pass every role check.
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.is_admin || allowed.contains(&self.role)
    }
}

impl From<&User> for SessionPrincipal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            is_admin: user.is_admin,
        }
    }
}

/// Signed session token claims (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID.
    pub id: i64,
    pub email: String,
    /// Role name; unknown values are rejected at verification.
    pub role: String,
    pub is_admin: bool,
    /// Issued at (unix seconds).
    pub iat: u64,
    /// Expiry (unix seconds).
    pub exp: u64,
    /// Unique token id.
    pub jti: String,
}

impl SessionClaims {
    pub fn new(principal: &SessionPrincipal, issued_at: u64, expires_at: u64) -> Self {
        Self {
            id: principal.id,
            email: principal.email.clone(),
            role: principal.role.as_str().to_string(),
            is_admin: principal.is_admin,
            iat: issued_at,
            exp: expires_at,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// The principal these claims describe, if the role is recognised.
    pub fn into_principal(self) -> Option<SessionPrincipal> {
        let role = self.role.parse().ok()?;
        Some(SessionPrincipal {
            id: self.id,
            email: self.email,
            role,
            is_admin: self.is_admin,
        })
    }
}
