//! Password login with an audit trail.

use std::sync::Arc;

use tracing::{info, warn};

use super::password::{verify_password, PasswordError};
use super::principal::SessionPrincipal;
use super::session::{IssuedSession, SessionIssuer};
use super::user_store::UserStore;
use super::validation::normalize_email;
use crate::audit::{reason, AuditLogger};
use crate::db::NewLoginEvent;
use crate::{Result, VerigateError};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// A login attempt with its client metadata.
#[derive(Debug, Clone)]
pub struct LoginAttempt<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub ip_address: &'a str,
    pub user_agent: &'a str,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub principal: SessionPrincipal,
    pub session: IssuedSession,
}

/// Checks credentials and issues sessions. Every attempt writes exactly one
/// login event.
pub struct LoginService {
    users: Arc<dyn UserStore>,
    audit: Arc<dyn AuditLogger>,
    issuer: SessionIssuer,
}

impl LoginService {
    pub fn new(users: Arc<dyn UserStore>, audit: Arc<dyn AuditLogger>, issuer: SessionIssuer) -> Self {
        Self {
            users,
            audit,
            issuer,
        }
    }

    /// Checks run in order: account exists, account active, password,
    /// email verified.
    pub async fn login(&self, attempt: LoginAttempt<'_>) -> Result<LoginOutcome> {
        let email = normalize_email(attempt.email);
        let fail = |user_id: Option<i64>, why: &str| {
            NewLoginEvent::failure(user_id, email.clone(), why)
                .with_client(attempt.ip_address, attempt.user_agent)
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.audit.log_event(fail(None, reason::USER_NOT_FOUND)).await;
            return Err(VerigateError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !user.is_active {
            self.audit
                .log_event(fail(Some(user.id), reason::INACTIVE_USER))
                .await;
            return Err(VerigateError::Forbidden(
                "Account is disabled. Contact an administrator.".to_string(),
            ));
        }

        if let Err(e) = verify_password(attempt.password, &user.password_hash) {
            if e == PasswordError::InvalidHash {
                warn!(user_id = user.id, "Stored password hash is malformed");
            }
            self.audit
                .log_event(fail(Some(user.id), reason::INVALID_PASSWORD))
                .await;
            return Err(VerigateError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.email_verified {
            self.audit
                .log_event(fail(Some(user.id), reason::UNVERIFIED_EMAIL))
                .await;
            return Err(VerigateError::Forbidden(
                "Email address is not verified. Check your inbox.".to_string(),
            ));
        }

        let principal = SessionPrincipal::from(&user);
        let session = match self.issuer.issue(&principal) {
            Ok(session) => session,
            Err(e) => {
                self.audit
                    .log_event(fail(Some(user.id), reason::SESSION_ERROR))
                    .await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .users
            .record_login(user.id, attempt.ip_address, attempt.user_agent)
            .await
        {
            warn!(user_id = user.id, "Failed to record login metadata: {}", e);
        }
        self.audit
            .log_event(
                NewLoginEvent::success(user.id, email.clone())
                    .with_client(attempt.ip_address, attempt.user_agent),
            )
            .await;

        info!(user_id = user.id, "User logged in");
        Ok(LoginOutcome { principal, session })
    }
}

#[cfg(all(test, feature = "sqlite", not(feature = "postgres")))]
mod tests {
    use super::*;
    use crate::audit::SqlAuditLogger;
    use crate::auth::{hash_password, SessionVerifier, SqlUserStore};
    use crate::db::{Database, LoginEventRepository, NewUser, Role, User, UserRepository};

    const SECRET: &str = "login-test-secret";
    const PASSWORD: &str = "password123";

    async fn setup(issuer_secret: Option<&str>) -> (Database, LoginService) {
        let db = Database::open_in_memory().await.unwrap();
        let service = LoginService::new(
            Arc::new(SqlUserStore::new(db.clone())),
            Arc::new(SqlAuditLogger::new(db.clone())),
            SessionIssuer::new(issuer_secret, 3600),
        );
        (db, service)
    }

    async fn add_user(db: &Database, email: &str, verified: bool) -> i64 {
        let mut new_user =
            NewUser::new(email, hash_password(PASSWORD).unwrap()).with_role(Role::Volunteer);
        new_user.email_verified = verified;
        UserRepository::new(db.pool())
            .create(&new_user)
            .await
            .unwrap()
            .id
    }

    fn attempt<'a>(email: &'a str, password: &'a str) -> LoginAttempt<'a> {
        LoginAttempt {
            email,
            password,
            ip_address: "192.0.2.1",
            user_agent: "test-agent",
        }
    }

    async fn last_reason(db: &Database) -> (bool, Option<String>) {
        let events = LoginEventRepository::new(db.pool())
            .list_recent(1)
            .await
            .unwrap();
        (events[0].success, events[0].failure_reason.clone())
    }

    #[tokio::test]
    async fn test_login_success() {
        let (db, service) = setup(Some(SECRET)).await;
        let id = add_user(&db, "ok@example.org", true).await;

        let outcome = service
            .login(attempt(" OK@example.org", PASSWORD))
            .await
            .unwrap();
        assert_eq!(outcome.principal.id, id);
        assert_eq!(outcome.principal.role, Role::Volunteer);

        let verifier = SessionVerifier::new(Some(SECRET));
        assert_eq!(
            verifier.verify(&outcome.session.token),
            Some(outcome.principal.clone())
        );

        assert_eq!(last_reason(&db).await, (true, None));
        let user = UserRepository::new(db.pool())
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.last_login_ip.as_deref(), Some("192.0.2.1"));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (db, service) = setup(Some(SECRET)).await;
        let result = service.login(attempt("ghost@example.org", PASSWORD)).await;
        assert!(matches!(result, Err(VerigateError::Unauthorized(_))));
        assert_eq!(
            last_reason(&db).await,
            (false, Some("user_not_found".to_string()))
        );
    }

    #[tokio::test]
    async fn test_inactive_user() {
        let (db, service) = setup(Some(SECRET)).await;
        let id = add_user(&db, "off@example.org", true).await;
        UserRepository::new(db.pool())
            .set_active(id, false)
            .await
            .unwrap();

        let result = service.login(attempt("off@example.org", PASSWORD)).await;
        assert!(matches!(result, Err(VerigateError::Forbidden(_))));
        assert_eq!(
            last_reason(&db).await,
            (false, Some("inactive_user".to_string()))
        );
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (db, service) = setup(Some(SECRET)).await;
        add_user(&db, "pw@example.org", true).await;

        let result = service.login(attempt("pw@example.org", "wrong-password")).await;
        assert!(matches!(result, Err(VerigateError::Unauthorized(_))));
        assert_eq!(
            last_reason(&db).await,
            (false, Some("invalid_password".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unverified_email() {
        let (db, service) = setup(Some(SECRET)).await;
        add_user(&db, "unv@example.org", false).await;

        let result = service.login(attempt("unv@example.org", PASSWORD)).await;
        assert!(matches!(result, Err(VerigateError::Forbidden(_))));
        assert_eq!(
            last_reason(&db).await,
            (false, Some("unverified_email".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_secret_records_failure() {
        let (db, service) = setup(None).await;
        add_user(&db, "ns@example.org", true).await;

        let result = service.login(attempt("ns@example.org", PASSWORD)).await;
        assert!(matches!(result, Err(VerigateError::Config(_))));
        assert_eq!(
            last_reason(&db).await,
            (false, Some("session_error".to_string()))
        );
    }

    /// Store whose login-metadata writes always fail.
    struct NoLoginMetadata(SqlUserStore);

    #[async_trait::async_trait]
    impl UserStore for NoLoginMetadata {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            self.0.find_by_email(email).await
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
            self.0.find_by_id(id).await
        }

        async fn mark_verified(&self, user_id: i64) -> Result<()> {
            self.0.mark_verified(user_id).await
        }

        async fn create(&self, new_user: &NewUser) -> Result<User> {
            self.0.create(new_user).await
        }

        async fn record_login(&self, _user_id: i64, _ip: &str, _user_agent: &str) -> Result<()> {
            Err(VerigateError::Database("store down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_login_metadata_failure_still_audited() {
        let db = Database::open_in_memory().await.unwrap();
        let service = LoginService::new(
            Arc::new(NoLoginMetadata(SqlUserStore::new(db.clone()))),
            Arc::new(SqlAuditLogger::new(db.clone())),
            SessionIssuer::new(Some(SECRET), 3600),
        );
        let id = add_user(&db, "meta@example.org", true).await;

        let outcome = service
            .login(attempt("meta@example.org", PASSWORD))
            .await
            .unwrap();
        assert_eq!(outcome.principal.id, id);

        let stats = LoginEventRepository::new(db.pool()).stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.successful, 1);
        assert_eq!(last_reason(&db).await, (true, None));
    }

    #[tokio::test]
    async fn test_one_event_per_attempt() {
        let (db, service) = setup(Some(SECRET)).await;
        add_user(&db, "c@example.org", true).await;

        let _ = service.login(attempt("c@example.org", PASSWORD)).await;
        let _ = service.login(attempt("c@example.org", "nope-nope")).await;
        let _ = service.login(attempt("nobody@example.org", PASSWORD)).await;

        let stats = LoginEventRepository::new(db.pool()).stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 1);
    }
}
