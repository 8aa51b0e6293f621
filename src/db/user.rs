//! User model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Row;

use super::DbRow;

/// User role for permission management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registered attendee.
    #[default]
    Participant,
    /// Event staff.
    Volunteer,
    /// Administrator.
    Admin,
}

impl Role {
    /// Convert role to its stored/claim string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }

    /// Whether this role counts as staff.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Volunteer | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "participant" => Ok(Role::Participant),
            "volunteer" => Ok(Role::Volunteer),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    /// Normalized (trimmed, lowercase) email, unique.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub is_admin: bool,
    pub email_verified: bool,
    pub is_active: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
    pub last_login_ip: Option<String>,
    pub last_login_user_agent: Option<String>,
}

impl<'r> sqlx::FromRow<'r, DbRow> for User {
    fn from_row(row: &'r DbRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            is_admin: row.try_get("is_admin")?,
            email_verified: row.try_get("email_verified")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            last_login_at: row.try_get("last_login_at")?,
            last_login_ip: row.try_get("last_login_ip")?,
            last_login_user_agent: row.try_get("last_login_user_agent")?,
        })
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Password hash (must already be hashed with Argon2).
    pub password_hash: String,
    pub role: Role,
    pub is_admin: bool,
    pub email_verified: bool,
}

impl NewUser {
    /// A participant with an unverified email.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::Participant,
            is_admin: false,
            email_verified: false,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn verified(mut self) -> Self {
        self.email_verified = true;
        self
    }
}
