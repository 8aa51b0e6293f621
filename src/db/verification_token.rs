//! Verification token repository.
//!
//! Rows are keyed by the SHA-256 hex digest of the raw token. Both write
//! paths that race (consume and cooldown-gated issue) are single conditional
//! statements, so correctness holds across processes sharing the database.
//!
//! A token is expired only once `now` is strictly past `expires_at`.

use chrono::Duration;

use super::{format_timestamp, parse_timestamp, Db, DbPool};
use crate::{Result, VerigateError};

const TOKEN_COLUMNS: &str = "token_hash, user_id, email, created_at, expires_at, consumed_at";

/// A stored verification token.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct VerificationToken {
    /// SHA-256 hex digest of the raw token.
    pub token_hash: String,
    pub user_id: i64,
    pub email: String,
    pub created_at: String,
    pub expires_at: String,
    pub consumed_at: Option<String>,
}

impl VerificationToken {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Expired when `now > expires_at`. Both are storage-format timestamps.
    pub fn is_expired(&self, now: &str) -> bool {
        self.expires_at.as_str() < now
    }

    /// Neither consumed nor expired.
    pub fn is_active(&self, now: &str) -> bool {
        !self.is_consumed() && !self.is_expired(now)
    }
}

/// Data for a new token row.
#[derive(Debug, Clone)]
pub struct NewVerificationToken {
    pub token_hash: String,
    pub user_id: i64,
    pub email: String,
    pub created_at: String,
    pub expires_at: String,
}

/// Repository for verification token rows.
pub struct VerificationTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> VerificationTokenRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a token unconditionally.
    ///
    /// With `supersede`, the user's other active tokens are expired one
    /// second before `new_token.created_at` in the same transaction.
    pub async fn create(
        &self,
        new_token: &NewVerificationToken,
        supersede: bool,
    ) -> Result<VerificationToken> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO verification_tokens (token_hash, user_id, email, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TOKEN_COLUMNS}"
        );
        let token = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(&new_token.token_hash)
            .bind(new_token.user_id)
            .bind(&new_token.email)
            .bind(&new_token.created_at)
            .bind(&new_token.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        if supersede {
            Self::supersede_others(&mut tx, &token).await?;
        }

        tx.commit().await?;
        Ok(token)
    }

    /// Insert a token only if the user has no active token created after
    /// `cooldown_cutoff`.
    ///
    /// Returns `None` when the cooldown blocked the insert. The check and the
    /// insert are one statement; on PostgreSQL a transaction-scoped advisory
    /// lock on the user id serialises concurrent callers.
    pub async fn create_unless_cooling_down(
        &self,
        new_token: &NewVerificationToken,
        cooldown_cutoff: &str,
        supersede: bool,
    ) -> Result<Option<VerificationToken>> {
        let mut tx = self.pool.begin().await?;

        #[cfg(feature = "postgres")]
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(new_token.user_id)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO verification_tokens (token_hash, user_id, email, created_at, expires_at)
             SELECT $1, $2, $3, $4, $5
             WHERE NOT EXISTS (
                 SELECT 1 FROM verification_tokens
                 WHERE user_id = $2
                   AND consumed_at IS NULL
                   AND expires_at >= $4
                   AND created_at > $6
             )
             RETURNING {TOKEN_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(&new_token.token_hash)
            .bind(new_token.user_id)
            .bind(&new_token.email)
            .bind(&new_token.created_at)
            .bind(&new_token.expires_at)
            .bind(cooldown_cutoff)
            .fetch_optional(&mut *tx)
            .await?;

        if let (Some(token), true) = (&inserted, supersede) {
            Self::supersede_others(&mut tx, token).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn supersede_others(
        tx: &mut sqlx::Transaction<'_, Db>,
        token: &VerificationToken,
    ) -> Result<u64> {
        let created_at = parse_timestamp(&token.created_at).ok_or_else(|| {
            VerigateError::Database(format!("invalid created_at: {}", token.created_at))
        })?;
        let superseded_at = format_timestamp(created_at - Duration::seconds(1));

        let result = sqlx::query(
            "UPDATE verification_tokens SET expires_at = $1
             WHERE user_id = $2
               AND token_hash <> $3
               AND consumed_at IS NULL
               AND expires_at >= $4",
        )
        .bind(&superseded_at)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(&token.created_at)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(
                user_id = token.user_id,
                superseded = result.rows_affected(),
                "Superseded older verification tokens"
            );
        }
        Ok(result.rows_affected())
    }

    pub async fn get_by_hash(&self, token_hash: &str) -> Result<Option<VerificationToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM verification_tokens WHERE token_hash = $1");
        let token = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(token_hash)
            .fetch_optional(self.pool)
            .await?;
        Ok(token)
    }

    /// Mark a token consumed if it is still unconsumed and unexpired at `now`.
    ///
    /// Exactly one of any number of concurrent callers gets `Some`.
    pub async fn consume(&self, token_hash: &str, now: &str) -> Result<Option<VerificationToken>> {
        let mut tx = self.pool.begin().await?;
        let token = Self::consume_in(&mut tx, token_hash, now).await?;
        tx.commit().await?;
        Ok(token)
    }

    /// Consume a token and mark its owner's email verified as one unit.
    ///
    /// If the user update fails the transaction rolls back and the token
    /// stays unconsumed, so the same link can be retried.
    pub async fn consume_and_verify(
        &self,
        token_hash: &str,
        now: &str,
    ) -> Result<Option<VerificationToken>> {
        let mut tx = self.pool.begin().await?;

        let Some(token) = Self::consume_in(&mut tx, token_hash, now).await? else {
            return Ok(None);
        };

        let result = sqlx::query("UPDATE users SET email_verified = $1 WHERE id = $2")
            .bind(true)
            .bind(token.user_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(VerigateError::NotFound("user".to_string()));
        }

        tx.commit().await?;
        Ok(Some(token))
    }

    async fn consume_in(
        tx: &mut sqlx::Transaction<'_, Db>,
        token_hash: &str,
        now: &str,
    ) -> Result<Option<VerificationToken>> {
        let sql = format!(
            "UPDATE verification_tokens
             SET consumed_at = $2
             WHERE token_hash = $1
               AND consumed_at IS NULL
               AND expires_at >= $2
             RETURNING {TOKEN_COLUMNS}"
        );
        let token = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(token)
    }

    /// Newest active token for a user, if any.
    pub async fn latest_active_for_user(
        &self,
        user_id: i64,
        now: &str,
    ) -> Result<Option<VerificationToken>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM verification_tokens
             WHERE user_id = $1 AND consumed_at IS NULL AND expires_at >= $2
             ORDER BY created_at DESC
             LIMIT 1"
        );
        let token = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(user_id)
            .bind(now)
            .fetch_optional(self.pool)
            .await?;
        Ok(token)
    }

    /// All tokens for a user, oldest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<VerificationToken>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM verification_tokens
             WHERE user_id = $1
             ORDER BY created_at ASC, token_hash ASC"
        );
        let tokens = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(tokens)
    }

    pub async fn count_by_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM verification_tokens WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
