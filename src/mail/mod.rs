//! Outbound verification mail.
//!
//! [`Mailer`] is the seam the verification and registration services call.
//! [`LogMailer`] writes the link to the log for local development;
//! [`ResendMailer`] delivers through the Resend HTTP API.

mod resend;
pub mod template;

pub use resend::ResendMailer;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::MailConfig;
use crate::{Result, VerigateError};

/// Sends verification emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a verification link to `to`, or return an error.
    async fn send_verification_email(&self, to: &str, verify_url: &str) -> Result<()>;
}

/// Development mailer that logs the link instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(&self, to: &str, verify_url: &str) -> Result<()> {
        info!(to = %to, url = %verify_url, "Verification email (log mailer)");
        Ok(())
    }
}

/// Build the mailer selected by `config.provider`.
pub fn from_config(config: &MailConfig, token_ttl_hours: i64) -> Result<Arc<dyn Mailer>> {
    match config.provider.as_str() {
        "log" => Ok(Arc::new(LogMailer)),
        "resend" => Ok(Arc::new(ResendMailer::new(config, token_ttl_hours)?)),
        other => Err(VerigateError::Config(format!(
            "unknown mail.provider: {other}"
        ))),
    }
}
