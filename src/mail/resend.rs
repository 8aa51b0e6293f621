//! Resend HTTP API mailer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::template::{verification_email_html, verification_email_text, VERIFICATION_SUBJECT};
use super::Mailer;
use crate::config::MailConfig;
use crate::{Result, VerigateError};

const USER_AGENT: &str = concat!("verigate/", env!("CARGO_PKG_VERSION"));

/// Longest provider error body carried into our error message.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
    text: String,
}

/// Sends mail through `POST {api_url}` with a bearer API key.
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
    token_ttl_hours: i64,
}

impl ResendMailer {
    pub fn new(config: &MailConfig, token_ttl_hours: i64) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| VerigateError::Config("mail.api_key is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VerigateError::Mail(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            from: config.from.clone(),
            token_ttl_hours,
        })
    }
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer")
            .field("api_url", &self.api_url)
            .field("from", &self.from)
            .finish()
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_verification_email(&self, to: &str, verify_url: &str) -> Result<()> {
        let body = SendEmailRequest {
            from: &self.from,
            to: [to],
            subject: VERIFICATION_SUBJECT,
            html: verification_email_html(verify_url, self.token_ttl_hours),
            text: verification_email_text(verify_url, self.token_ttl_hours),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VerigateError::Mail(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let mut detail = response.text().await.unwrap_or_default();
            if detail.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !detail.is_char_boundary(cut) {
                    cut -= 1;
                }
                detail.truncate(cut);
            }
            return Err(VerigateError::Mail(format!(
                "provider returned {status}: {detail}"
            )));
        }

        tracing::info!(to = %to, "Verification email sent");
        Ok(())
    }
}
