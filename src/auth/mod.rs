//! Authentication: sessions, credentials, registration and role checks.

pub mod access;
mod login;
mod password;
mod principal;
mod registration;
mod session;
mod user_store;
pub mod validation;

pub use access::{require_role, STAFF_ROLES};
pub use login::{LoginAttempt, LoginOutcome, LoginService};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use principal::{SessionClaims, SessionPrincipal};
pub use registration::{RegistrationRequest, RegistrationService, REGISTERED_MESSAGE};
pub use session::{IssuedSession, SessionIssuer, SessionVerifier};
pub use user_store::{SqlUserStore, UserStore};
pub use validation::ValidationError;
