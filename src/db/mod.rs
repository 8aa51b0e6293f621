//! Database module for verigate.
//!
//! Connection pooling and migrations over sqlx. SQLite is the default
//! backend; PostgreSQL is available behind the `postgres` feature.
//!
//! Timestamps are stored as `TEXT` in [`TIMESTAMP_FORMAT`] (UTC) and computed
//! in Rust, so ordering and expiry checks are plain string comparisons on
//! both backends.

mod login_event;
mod repository;
mod schema;
mod user;
mod verification_token;

pub use login_event::{LoginEvent, LoginEventRepository, LoginStats, NewLoginEvent};
pub use repository::UserRepository;
pub use schema::MIGRATIONS;
pub use user::{NewUser, Role, User};
pub use verification_token::{NewVerificationToken, VerificationToken, VerificationTokenRepository};

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::Result;

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type Db = sqlx::Sqlite;
#[cfg(feature = "postgres")]
pub type Db = sqlx::Postgres;

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type DbPool = sqlx::SqlitePool;
#[cfg(feature = "postgres")]
pub type DbPool = sqlx::PgPool;

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type DbRow = sqlx::sqlite::SqliteRow;
#[cfg(feature = "postgres")]
pub type DbRow = sqlx::postgres::PgRow;

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub const SQL_TRUE: &str = "1";
#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub const SQL_FALSE: &str = "0";
#[cfg(feature = "postgres")]
pub const SQL_TRUE: &str = "TRUE";
#[cfg(feature = "postgres")]
pub const SQL_FALSE: &str = "FALSE";

/// Storage format for all timestamp columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC instant for storage.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp back into a UTC instant.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Current time in storage format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Database handle owning the connection pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open the database described by `config`.
    ///
    /// `config.url` wins over `config.path` when both are set.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        match &config.url {
            Some(url) => Self::open_url(url, config.max_connections).await,
            None => Self::open(&config.path, config.max_connections).await,
        }
    }

    /// Open (creating if needed) a SQLite database file and run migrations.
    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening database at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[cfg(feature = "postgres")]
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let url = path.as_ref().to_string_lossy().to_string();
        Self::open_url(&url, max_connections).await
    }

    /// Open a database from a connection URL and run migrations.
    pub async fn open_url(url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to database");

        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        let pool = {
            use std::str::FromStr;
            let options = sqlx::sqlite::SqliteConnectOptions::from_str(url)?
                .create_if_missing(true)
                .busy_timeout(Duration::from_secs(5))
                .foreign_keys(true);
            sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        #[cfg(feature = "postgres")]
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open a private in-memory database for tests.
    ///
    /// Limited to one connection: every connection to `sqlite::memory:`
    /// would otherwise see its own empty database.
    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub async fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory database");
        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// The underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Highest applied migration, or 0 on a fresh database.
    pub async fn schema_version(&self) -> Result<i64> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version     INTEGER PRIMARY KEY,
                applied_at  TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
                .fetch_one(&self.pool)
                .await?;
        Ok(version)
    }

    /// Apply pending migrations, each in its own transaction.
    pub async fn migrate(&self) -> Result<()> {
        let current_version = self.schema_version().await?;

        if current_version as usize >= MIGRATIONS.len() {
            debug!("Database is up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating database from version {} to {}",
            current_version,
            MIGRATIONS.len()
        );

        for (i, migration) in MIGRATIONS.iter().enumerate().skip(current_version as usize) {
            let version = (i + 1) as i64;
            debug!("Applying migration v{}", version);

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES ($1, $2)")
                .bind(version)
                .bind(now_timestamp())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        info!(
            "Database migration complete (now at version {})",
            MIGRATIONS.len()
        );
        Ok(())
    }

    /// Check if a table exists.
    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=$1)",
        )
        .bind(table_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[cfg(feature = "postgres")]
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_name=$1)",
        )
        .bind(table_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(all(test, feature = "sqlite", not(feature = "postgres")))]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_open_in_memory_migrates() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap() as usize, MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_tables_exist() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(db.table_exists("schema_version").await.unwrap());
        assert!(db.table_exists("users").await.unwrap());
        assert!(db.table_exists("verification_tokens").await.unwrap());
        assert!(db.table_exists("login_events").await.unwrap());
        assert!(!db.table_exists("boards").await.unwrap());
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap() as usize, MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("verigate.db");

        {
            let db = Database::open(&path, 2).await.unwrap();
            sqlx::query(
                "INSERT INTO users (email, password_hash, role, created_at)
                 VALUES ('a@example.org', 'x', 'participant', '2026-01-01 00:00:00')",
            )
            .execute(db.pool())
            .await
            .unwrap();
            db.close().await;
        }

        let db = Database::open(&path, 2).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_timestamp_round_trip_and_ordering() {
        let a = Utc.with_ymd_and_hms(2026, 3, 9, 8, 5, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 11, 20, 17, 0, 0).unwrap();

        let sa = format_timestamp(a);
        assert_eq!(sa, "2026-03-09 08:05:01");
        assert_eq!(parse_timestamp(&sa), Some(a));
        assert!(sa < format_timestamp(b));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
