//! Login audit trail.
//!
//! Recording is best effort. [`AuditLogger::log_event`] has no error to
//! return: store failures are reported through `tracing` and never change
//! the outcome of the login that produced the event.

use async_trait::async_trait;
use tracing::warn;

use crate::db::{Database, LoginEventRepository, NewLoginEvent};

/// Stable `failure_reason` values.
pub mod reason {
    pub const USER_NOT_FOUND: &str = "user_not_found";
    pub const INACTIVE_USER: &str = "inactive_user";
    pub const INVALID_PASSWORD: &str = "invalid_password";
    pub const UNVERIFIED_EMAIL: &str = "unverified_email";
    pub const SESSION_ERROR: &str = "session_error";
}

/// Append-only recorder of authentication attempts.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log_event(&self, event: NewLoginEvent);
}

/// [`AuditLogger`] writing to the `login_events` table.
#[derive(Clone, Debug)]
pub struct SqlAuditLogger {
    db: Database,
}

impl SqlAuditLogger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditLogger for SqlAuditLogger {
    async fn log_event(&self, event: NewLoginEvent) {
        if let Err(e) = LoginEventRepository::new(self.db.pool()).create(&event).await {
            warn!(
                email = %event.email,
                success = event.success,
                "Failed to record login event: {}",
                e
            );
        }
    }
}
