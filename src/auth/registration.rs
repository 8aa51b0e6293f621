//! Account registration.

use std::sync::Arc;

use tracing::{info, warn};

use super::password::hash_password;
use super::user_store::UserStore;
use super::validation::parse_email;
use crate::db::{NewUser, Role, User};
use crate::mail::Mailer;
use crate::verification::VerificationService;
use crate::{Result, VerigateError};

pub const REGISTERED_MESSAGE: &str =
    "Registration successful. Check your email to verify your account.";

#[derive(Debug, Clone)]
pub struct RegistrationRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub is_volunteer: bool,
}

/// Creates unverified accounts and sends the first verification email.
pub struct RegistrationService {
    users: Arc<dyn UserStore>,
    verification: Arc<VerificationService>,
    mailer: Arc<dyn Mailer>,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        verification: Arc<VerificationService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            users,
            verification,
            mailer,
        }
    }

    /// Register an account.
    ///
    /// A mail failure is logged and not returned; the user can ask for a
    /// resend.
    pub async fn register(&self, request: RegistrationRequest<'_>) -> Result<User> {
        let email =
            parse_email(request.email).map_err(|e| VerigateError::Validation(e.to_string()))?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(VerigateError::Conflict(
                "an account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(request.password)?;
        let role = if request.is_volunteer {
            Role::Volunteer
        } else {
            Role::Participant
        };
        let user = self
            .users
            .create(&NewUser::new(email, password_hash).with_role(role))
            .await?;

        let issued = self.verification.issue_token(user.id, &user.email).await?;
        if let Err(e) = self
            .mailer
            .send_verification_email(&user.email, &issued.verify_url)
            .await
        {
            warn!(user_id = user.id, "Registration mail failed: {}", e);
        }

        info!(user_id = user.id, role = %user.role, "User registered");
        Ok(user)
    }
}
