//! verigate - session verification and email-verification tokens.
//!
//! Verifies signed session cookies, gates endpoints by role, and runs the
//! email verification flow: issuing single-use tokens, re-sending them under
//! a per-user cooldown, and consuming them exactly once.

pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod verification;
pub mod web;

pub use audit::{AuditLogger, SqlAuditLogger};
pub use auth::{
    require_role, LoginService, RegistrationService, SessionIssuer, SessionPrincipal,
    SessionVerifier, SqlUserStore, UserStore, STAFF_ROLES,
};
pub use config::Config;
pub use db::{Database, Role, User};
pub use error::{Result, VerigateError};
pub use mail::{LogMailer, Mailer};
pub use verification::{ResendOutcome, VerificationService, VerifiedEmail};
pub use web::WebServer;
