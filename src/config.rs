//! Configuration module for verigate.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, VerigateError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Per-IP limit for `/auth` and `/verification` endpoints (requests per minute).
    #[serde(default = "default_auth_rate_limit")]
    pub auth_rate_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_auth_rate_limit() -> u32 {
    20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            auth_rate_limit: default_auth_rate_limit(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Connection URL; takes precedence over `path` when set.
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/verigate.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/verigate.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret for signing session tokens. Sessions fail closed when unset.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_expiry")]
    pub expiry_secs: u64,
    /// Name of the HTTP-only cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Whether to set the `Secure` attribute on the session cookie.
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_session_expiry() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

fn default_cookie_name() -> String {
    "session_token".to_string()
}

impl SessionConfig {
    /// The configured secret, treating an empty string as absent.
    pub fn secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            expiry_secs: default_session_expiry(),
            cookie_name: default_cookie_name(),
            cookie_secure: false,
        }
    }
}

/// Email verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Minimum seconds between two issued tokens for the same user.
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: i64,
    /// Public base URL used to build verification links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the verification endpoint, appended to `base_url`.
    #[serde(default = "default_verify_path")]
    pub verify_path: String,
    /// Whether a newly issued token voids the user's older outstanding tokens.
    #[serde(default = "default_supersede_previous")]
    pub supersede_previous: bool,
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_resend_cooldown() -> i64 {
    60
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_verify_path() -> String {
    "/verification/verify".to_string()
}

fn default_supersede_previous() -> bool {
    true
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
            resend_cooldown_secs: default_resend_cooldown(),
            base_url: default_base_url(),
            verify_path: default_verify_path(),
            supersede_previous: default_supersede_previous(),
        }
    }
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Delivery provider: `log` or `resend`.
    #[serde(default = "default_mail_provider")]
    pub provider: String,
    /// Sender address.
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Provider API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Provider API endpoint.
    #[serde(default = "default_mail_api_url")]
    pub api_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

fn default_mail_provider() -> String {
    "log".to_string()
}

fn default_mail_from() -> String {
    "noreply@localhost".to_string()
}

fn default_mail_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_mail_timeout() -> u64 {
    10
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: default_mail_provider(),
            from: default_mail_from(),
            api_key: None,
            api_url: default_mail_api_url(),
            timeout_secs: default_mail_timeout(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Email verification configuration.
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(VerigateError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| VerigateError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `VERIGATE_JWT_SECRET`: session signing secret
    /// - `VERIGATE_MAIL_API_KEY`: mail provider API key
    /// - `VERIGATE_BASE_URL`: public base URL for verification links
    /// - `VERIGATE_DATABASE_URL`: database connection URL
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = non_empty_env("VERIGATE_JWT_SECRET") {
            self.session.jwt_secret = Some(secret);
        }
        if let Some(key) = non_empty_env("VERIGATE_MAIL_API_KEY") {
            self.mail.api_key = Some(key);
        }
        if let Some(base_url) = non_empty_env("VERIGATE_BASE_URL") {
            self.verification.base_url = base_url;
        }
        if let Some(url) = non_empty_env("VERIGATE_DATABASE_URL") {
            self.database.url = Some(url);
        }
    }

    /// Validate the configuration.
    ///
    /// A missing session secret is not an error here: the server still starts
    /// and every session check fails closed.
    pub fn validate(&self) -> Result<()> {
        if self.verification.token_ttl_hours <= 0 {
            return Err(VerigateError::Config(
                "verification.token_ttl_hours must be positive".to_string(),
            ));
        }
        if self.verification.resend_cooldown_secs < 0 {
            return Err(VerigateError::Config(
                "verification.resend_cooldown_secs must not be negative".to_string(),
            ));
        }
        if url::Url::parse(&self.verification.base_url).is_err() {
            return Err(VerigateError::Config(format!(
                "verification.base_url is not a valid URL: {}",
                self.verification.base_url
            )));
        }
        match self.mail.provider.as_str() {
            "log" => {}
            "resend" => {
                if self.mail.api_key.as_deref().unwrap_or("").is_empty() {
                    return Err(VerigateError::Config(
                        "mail.provider is \"resend\" but mail.api_key is not set. \
                         Set it in config.toml or via VERIGATE_MAIL_API_KEY."
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(VerigateError::Config(format!(
                    "unknown mail.provider: {other}"
                )));
            }
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
