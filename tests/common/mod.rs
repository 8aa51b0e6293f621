//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{Duration, Utc};

use verigate::auth::{hash_password, SqlUserStore};
use verigate::config::Config;
use verigate::db::{format_timestamp, NewUser, Role, User, UserRepository};
use verigate::mail::Mailer;
use verigate::{Database, Result, VerificationService, VerigateError, WebServer};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Mailer that keeps every link it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Raw token from the most recent link sent to `email`.
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, url)| token_from_url(&url))
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(&self, to: &str, verify_url: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), verify_url.to_string()));
        Ok(())
    }
}

/// Mailer whose provider is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_verification_email(&self, _to: &str, _verify_url: &str) -> Result<()> {
        Err(VerigateError::Mail("provider unavailable".to_string()))
    }
}

pub fn token_from_url(url: &str) -> String {
    let parsed = url::Url::parse(url).unwrap();
    parsed
        .query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.auth_rate_limit = 1000;
    config.session.jwt_secret = Some(TEST_SECRET.to_string());
    config
}

pub async fn create_user(db: &Database, email: &str, role: Role, verified: bool) -> User {
    let hash = hash_password(TEST_PASSWORD).unwrap();
    let mut new_user = NewUser::new(email, hash).with_role(role);
    if verified {
        new_user = new_user.verified();
    }
    UserRepository::new(db.pool()).create(&new_user).await.unwrap()
}

pub fn verification_service(
    db: &Database,
    mailer: Arc<dyn Mailer>,
    config: &Config,
) -> VerificationService {
    VerificationService::new(
        db.clone(),
        Arc::new(SqlUserStore::new(db.clone())),
        mailer,
        config.verification.clone(),
    )
}

/// Move every token of `user_id` back in time by `secs`.
pub async fn age_tokens(db: &Database, user_id: i64, secs: i64) {
    let created = format_timestamp(Utc::now() - Duration::seconds(secs));
    sqlx::query("UPDATE verification_tokens SET created_at = $1 WHERE user_id = $2")
        .bind(created)
        .bind(user_id)
        .execute(db.pool())
        .await
        .unwrap();
}

/// Force every token of `user_id` past its expiry.
pub async fn expire_tokens(db: &Database, user_id: i64) {
    let past = format_timestamp(Utc::now() - Duration::seconds(1));
    sqlx::query("UPDATE verification_tokens SET expires_at = $1 WHERE user_id = $2")
        .bind(past)
        .bind(user_id)
        .execute(db.pool())
        .await
        .unwrap();
}

/// HTTP test server over an in-memory database.
pub async fn create_test_server(
    config: &Config,
    mailer: Arc<dyn Mailer>,
) -> (TestServer, Database) {
    let db = Database::open_in_memory().await.unwrap();
    let router = WebServer::new(config, db.clone(), mailer).unwrap().router();
    let server = TestServer::new(router).unwrap();
    (server, db)
}
