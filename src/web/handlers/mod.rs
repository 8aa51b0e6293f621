//! Route handlers and shared application state.

pub mod auth;
pub mod stats;
pub mod verification;

pub use auth::{login, logout, me, register};
pub use stats::login_event_stats;
pub use verification::{resend_verification, verify_email};

use std::sync::Arc;

use crate::audit::{AuditLogger, SqlAuditLogger};
use crate::auth::{LoginService, RegistrationService, SessionIssuer, SqlUserStore, UserStore};
use crate::config::{Config, SessionConfig};
use crate::mail::Mailer;
use crate::verification::VerificationService;
use crate::Database;

/// State shared by every handler.
pub struct AppState {
    pub db: Database,
    pub verification: Arc<VerificationService>,
    pub login: Arc<LoginService>,
    pub registration: Arc<RegistrationService>,
    pub session: SessionConfig,
}

impl AppState {
    /// Wire the SQL-backed services around `db`.
    pub fn new(db: Database, config: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(SqlUserStore::new(db.clone()));
        let audit: Arc<dyn AuditLogger> = Arc::new(SqlAuditLogger::new(db.clone()));

        let verification = Arc::new(VerificationService::new(
            db.clone(),
            users.clone(),
            mailer.clone(),
            config.verification.clone(),
        ));
        let login = Arc::new(LoginService::new(
            users.clone(),
            audit,
            SessionIssuer::from_config(&config.session),
        ));
        let registration = Arc::new(RegistrationService::new(
            users,
            verification.clone(),
            mailer,
        ));

        Self {
            db,
            verification,
            login,
            registration,
            session: config.session.clone(),
        }
    }
}
