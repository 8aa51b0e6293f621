//! User repository.

use super::user::{NewUser, User};
use super::{now_timestamp, DbPool};
use crate::{Result, VerigateError};

const USER_COLUMNS: &str = "id, email, password_hash, role, is_admin, email_verified, is_active,
     created_at, last_login_at, last_login_ip, last_login_user_agent";

/// Repository for user rows.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a user and return the stored row.
    ///
    /// Fails with `Conflict` if the email is already registered.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, role, is_admin, email_verified, created_at)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(new_user.is_admin)
        .bind(new_user.email_verified)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                VerigateError::Conflict("email is already registered".to_string())
            }
            _ => VerigateError::Database(e.to_string()),
        })?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| VerigateError::NotFound("user".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Look up a user by email. The caller passes the normalized form.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Set `email_verified`. Returns false if the user does not exist.
    pub async fn mark_verified(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET email_verified = $1 WHERE id = $2")
            .bind(true)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful login.
    pub async fn update_last_login(&self, id: i64, ip: &str, user_agent: &str) -> Result<()> {
        sqlx::query(
            "UPDATE users SET last_login_at = $1, last_login_ip = $2, last_login_user_agent = $3
             WHERE id = $4",
        )
        .bind(now_timestamp())
        .bind(ip)
        .bind(user_agent)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
