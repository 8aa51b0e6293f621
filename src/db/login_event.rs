//! Login event repository (append-only audit trail).

use serde::Serialize;

use super::{now_timestamp, DbPool};
use crate::Result;

/// A recorded authentication attempt.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LoginEvent {
    pub id: i64,
    /// Known only when the email matched an account.
    pub user_id: Option<i64>,
    pub email: String,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

/// Data for a new login event.
#[derive(Debug, Clone, Default)]
pub struct NewLoginEvent {
    pub user_id: Option<i64>,
    pub email: String,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewLoginEvent {
    pub fn success(user_id: i64, email: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            email: email.into(),
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(user_id: Option<i64>, email: impl Into<String>, reason: &str) -> Self {
        Self {
            user_id,
            email: email.into(),
            success: false,
            failure_reason: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn with_client(mut self, ip_address: &str, user_agent: &str) -> Self {
        self.ip_address = Some(ip_address.to_string());
        self.user_agent = Some(user_agent.to_string());
        self
    }
}

/// Aggregate counts over the audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoginStats {
    pub total: i64,
    pub successful: i64,
    pub failed: i64,
}

/// Repository for login events. Insert and read only.
pub struct LoginEventRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> LoginEventRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, event: &NewLoginEvent) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO login_events
                 (user_id, email, success, failure_reason, ip_address, user_agent, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(event.user_id)
        .bind(&event.email)
        .bind(event.success)
        .bind(&event.failure_reason)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Most recent events first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<LoginEvent>> {
        let events = sqlx::query_as::<_, LoginEvent>(
            "SELECT id, user_id, email, success, failure_reason, ip_address, user_agent, created_at
             FROM login_events
             ORDER BY id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(events)
    }

    pub async fn stats(&self) -> Result<LoginStats> {
        let (total, successful): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN success THEN 1 ELSE 0 END), 0)
             FROM login_events",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(LoginStats {
            total,
            successful,
            failed: total - successful,
        })
    }
}
