//! User lookup and update seam used by the auth services.

use async_trait::async_trait;

use crate::db::{Database, NewUser, User, UserRepository};
use crate::{Result, VerigateError};

/// Account storage as seen by login, registration and verification.
///
/// Emails passed in are already normalized.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Set the verified flag. Idempotent; `NotFound` if the user is gone.
    async fn mark_verified(&self, user_id: i64) -> Result<()>;

    /// `Conflict` if the email is taken.
    async fn create(&self, new_user: &NewUser) -> Result<User>;

    async fn record_login(&self, user_id: i64, ip: &str, user_agent: &str) -> Result<()>;
}

/// [`UserStore`] over the `users` table.
#[derive(Clone, Debug)]
pub struct SqlUserStore {
    db: Database,
}

impl SqlUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        UserRepository::new(self.db.pool()).get_by_email(email).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        UserRepository::new(self.db.pool()).get_by_id(id).await
    }

    async fn mark_verified(&self, user_id: i64) -> Result<()> {
        if UserRepository::new(self.db.pool())
            .mark_verified(user_id)
            .await?
        {
            Ok(())
        } else {
            Err(VerigateError::NotFound("user".to_string()))
        }
    }

    async fn create(&self, new_user: &NewUser) -> Result<User> {
        UserRepository::new(self.db.pool()).create(new_user).await
    }

    async fn record_login(&self, user_id: i64, ip: &str, user_agent: &str) -> Result<()> {
        UserRepository::new(self.db.pool())
            .update_last_login(user_id, ip, user_agent)
            .await
    }
}
