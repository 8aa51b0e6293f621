//! Database schema and migrations.
//!
//! Migrations are applied in order; `schema_version` records which ones
//! have run.

/// Database migrations (SQLite).
#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    email                   TEXT NOT NULL UNIQUE,
    password_hash           TEXT NOT NULL,           -- Argon2 hash
    role                    TEXT NOT NULL DEFAULT 'participant',
    is_admin                INTEGER NOT NULL DEFAULT 0,
    email_verified          INTEGER NOT NULL DEFAULT 0,
    is_active               INTEGER NOT NULL DEFAULT 1,
    created_at              TEXT NOT NULL,
    last_login_at           TEXT,
    last_login_ip           TEXT,
    last_login_user_agent   TEXT
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: verification tokens, keyed by SHA-256 of the raw token
    r#"
CREATE TABLE verification_tokens (
    token_hash  TEXT PRIMARY KEY,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    email       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL,
    consumed_at TEXT
);

CREATE INDEX idx_verification_tokens_user ON verification_tokens(user_id, created_at);
CREATE INDEX idx_verification_tokens_expires ON verification_tokens(expires_at);
"#,
    // v3: login audit trail
    r#"
CREATE TABLE login_events (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER,
    email           TEXT NOT NULL,
    success         INTEGER NOT NULL,
    failure_reason  TEXT,
    ip_address      TEXT,
    user_agent      TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX idx_login_events_created ON login_events(created_at);
CREATE INDEX idx_login_events_email ON login_events(email);
"#,
];

/// Database migrations (PostgreSQL).
#[cfg(feature = "postgres")]
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id                      BIGSERIAL PRIMARY KEY,
    email                   TEXT NOT NULL UNIQUE,
    password_hash           TEXT NOT NULL,
    role                    TEXT NOT NULL DEFAULT 'participant',
    is_admin                BOOLEAN NOT NULL DEFAULT FALSE,
    email_verified          BOOLEAN NOT NULL DEFAULT FALSE,
    is_active               BOOLEAN NOT NULL DEFAULT TRUE,
    created_at              TEXT NOT NULL,
    last_login_at           TEXT,
    last_login_ip           TEXT,
    last_login_user_agent   TEXT
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: verification tokens, keyed by SHA-256 of the raw token
    r#"
CREATE TABLE verification_tokens (
    token_hash  TEXT PRIMARY KEY,
    user_id     BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    email       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL,
    consumed_at TEXT
);

CREATE INDEX idx_verification_tokens_user ON verification_tokens(user_id, created_at);
CREATE INDEX idx_verification_tokens_expires ON verification_tokens(expires_at);
"#,
    // v3: login audit trail
    r#"
CREATE TABLE login_events (
    id              BIGSERIAL PRIMARY KEY,
    user_id         BIGINT,
    email           TEXT NOT NULL,
    success         BOOLEAN NOT NULL,
    failure_reason  TEXT,
    ip_address      TEXT,
    user_agent      TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX idx_login_events_created ON login_events(created_at);
CREATE INDEX idx_login_events_email ON login_events(email);
"#,
];
