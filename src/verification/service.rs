//! Email verification token lifecycle: issue, resend, verify.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use super::token::{build_verify_url, generate_token, hash_token};
use crate::auth::validation::parse_email;
use crate::auth::UserStore;
use crate::config::VerificationConfig;
use crate::db::{
    format_timestamp, now_timestamp, parse_timestamp, Database, NewVerificationToken,
    VerificationTokenRepository,
};
use crate::mail::Mailer;
use crate::{Result, VerigateError};

/// Response message for every non-failing resend, whatever the outcome.
pub const RESEND_MESSAGE: &str =
    "If the address belongs to an unverified account, a verification email has been sent.";

/// Response message after a successful verification.
pub const VERIFIED_MESSAGE: &str = "Email verified successfully.";

/// A freshly issued token. `token` is the raw value and must only go into
/// the email link.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub verify_url: String,
    pub expires_at: String,
}

/// What a resend request did. Callers answer all three the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    AlreadyVerified,
    UnknownEmail,
}

/// Result of consuming a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEmail {
    pub user_id: i64,
    pub email: String,
}

/// Issues, resends and consumes verification tokens.
pub struct VerificationService {
    db: Database,
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    config: VerificationConfig,
}

impl VerificationService {
    pub fn new(
        db: Database,
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            db,
            users,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    fn new_token_row(&self, user_id: i64, email: &str) -> Result<(IssuedToken, NewVerificationToken)> {
        let now = Utc::now();
        let token = generate_token();
        let verify_url = build_verify_url(&self.config.base_url, &self.config.verify_path, &token)?;
        let expires_at = format_timestamp(now + Duration::hours(self.config.token_ttl_hours));

        let row = NewVerificationToken {
            token_hash: hash_token(&token),
            user_id,
            email: email.to_string(),
            created_at: format_timestamp(now),
            expires_at: expires_at.clone(),
        };
        let issued = IssuedToken {
            token,
            verify_url,
            expires_at,
        };
        Ok((issued, row))
    }

    /// Persist a new token for `user_id`. Sends nothing.
    pub async fn issue_token(&self, user_id: i64, email: &str) -> Result<IssuedToken> {
        let (issued, row) = self.new_token_row(user_id, email)?;
        VerificationTokenRepository::new(self.db.pool())
            .create(&row, self.config.supersede_previous)
            .await?;

        debug!(user_id, token_hash = %row.token_hash, "Issued verification token");
        Ok(issued)
    }

    /// Issue and mail a new token unless the address is unknown, already
    /// verified, or still inside the resend cooldown.
    ///
    /// A mail failure is returned as an error, but the issued token stays and
    /// holds the cooldown.
    pub async fn resend_verification(&self, raw_email: &str) -> Result<ResendOutcome> {
        let email = parse_email(raw_email).map_err(|e| VerigateError::Validation(e.to_string()))?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            info!("Verification resend requested for unknown address");
            return Ok(ResendOutcome::UnknownEmail);
        };
        if user.email_verified {
            debug!(user_id = user.id, "Verification resend for verified account ignored");
            return Ok(ResendOutcome::AlreadyVerified);
        }

        let (issued, row) = self.new_token_row(user.id, &user.email)?;
        let cutoff = format_timestamp(Utc::now() - Duration::seconds(self.config.resend_cooldown_secs));

        let inserted = VerificationTokenRepository::new(self.db.pool())
            .create_unless_cooling_down(&row, &cutoff, self.config.supersede_previous)
            .await?;
        if inserted.is_none() {
            let retry_after_secs = self.retry_after(user.id).await;
            info!(user_id = user.id, retry_after_secs, "Verification resend rate limited");
            return Err(VerigateError::RateLimited { retry_after_secs });
        }

        if let Err(e) = self
            .mailer
            .send_verification_email(&user.email, &issued.verify_url)
            .await
        {
            error!(user_id = user.id, "Failed to send verification email: {}", e);
            return Err(e);
        }

        info!(user_id = user.id, "Verification email re-sent");
        Ok(ResendOutcome::Sent)
    }

    /// Seconds until the newest active token leaves the cooldown window.
    async fn retry_after(&self, user_id: i64) -> u64 {
        let cooldown = self.config.resend_cooldown_secs.max(1) as u64;
        let latest = VerificationTokenRepository::new(self.db.pool())
            .latest_active_for_user(user_id, &now_timestamp())
            .await;

        match latest {
            Ok(Some(token)) => match parse_timestamp(&token.created_at) {
                Some(created) => {
                    let elapsed = (Utc::now() - created).num_seconds().max(0) as u64;
                    cooldown.saturating_sub(elapsed).max(1)
                }
                None => cooldown,
            },
            Ok(None) => cooldown,
            Err(e) => {
                warn!("Failed to compute resend retry delay: {}", e);
                cooldown
            }
        }
    }

    /// Consume a raw token and mark its owner verified.
    ///
    /// Fails with `NotFound`, `TokenAlreadyUsed` or `TokenExpired`. Of any
    /// number of concurrent calls with the same token at most one succeeds;
    /// the others get `TokenAlreadyUsed`.
    pub async fn verify_email_token(&self, raw_token: &str) -> Result<VerifiedEmail> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(VerigateError::Validation("token is required".to_string()));
        }

        let token_hash = hash_token(raw_token);
        let repo = VerificationTokenRepository::new(self.db.pool());
        let now = now_timestamp();

        let existing = repo
            .get_by_hash(&token_hash)
            .await?
            .ok_or_else(|| VerigateError::NotFound("verification token".to_string()))?;
        if existing.is_consumed() {
            return Err(VerigateError::TokenAlreadyUsed);
        }
        if existing.is_expired(&now) {
            return Err(VerigateError::TokenExpired);
        }

        // Token consumption and the user update commit together.
        let consumed = match repo.consume_and_verify(&token_hash, &now).await {
            Ok(Some(consumed)) => consumed,
            Ok(None) => {
                // Lost the race, or the token expired between the two statements.
                return match repo.get_by_hash(&token_hash).await? {
                    Some(row) if row.is_consumed() => Err(VerigateError::TokenAlreadyUsed),
                    Some(_) => Err(VerigateError::TokenExpired),
                    None => Err(VerigateError::NotFound("verification token".to_string())),
                };
            }
            Err(e) => {
                error!(
                    user_id = existing.user_id,
                    "Failed to verify email, token left unconsumed: {}", e
                );
                return Err(e);
            }
        };

        info!(user_id = consumed.user_id, "Email verified");
        Ok(VerifiedEmail {
            user_id: consumed.user_id,
            email: consumed.email,
        })
    }
}
