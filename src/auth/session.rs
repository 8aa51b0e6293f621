//! Session token verification and issuance.
//!
//! Both sides hold an optional secret. Without one, [`SessionVerifier`]
//! yields no principal for any input and [`SessionIssuer`] refuses to sign.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::principal::{SessionClaims, SessionPrincipal};
use crate::config::SessionConfig;
use crate::{Result, VerigateError};

/// Decodes signed session tokens into principals.
///
/// Pure in-memory work: no store access and no panics. Every failure
/// (missing secret, bad signature, malformed token, past expiry, unknown
/// role) comes back as `None`.
#[derive(Clone)]
pub struct SessionVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl SessionVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        let key = secret
            .filter(|s| !s.is_empty())
            .map(|s| DecodingKey::from_secret(s.as_bytes()));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self { key, validation }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.secret())
    }

    /// Whether a signing secret is configured.
    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    pub fn verify(&self, raw_token: &str) -> Option<SessionPrincipal> {
        let key = self.key.as_ref()?;
        if raw_token.is_empty() {
            return None;
        }

        match decode::<SessionClaims>(raw_token, key, &self.validation) {
            Ok(data) => data.claims.into_principal(),
            Err(e) => {
                tracing::debug!("Session token rejected: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    /// Expiry (unix seconds).
    pub expires_at: u64,
    /// Lifetime, for the cookie `Max-Age`.
    pub max_age_secs: u64,
}

/// Signs session tokens after a successful login.
#[derive(Clone)]
pub struct SessionIssuer {
    key: Option<EncodingKey>,
    expiry_secs: u64,
}

impl SessionIssuer {
    pub fn new(secret: Option<&str>, expiry_secs: u64) -> Self {
        let key = secret
            .filter(|s| !s.is_empty())
            .map(|s| EncodingKey::from_secret(s.as_bytes()));
        Self { key, expiry_secs }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.secret(), config.expiry_secs)
    }

    pub fn issue(&self, principal: &SessionPrincipal) -> Result<IssuedSession> {
        let key = self.key.as_ref().ok_or_else(|| {
            VerigateError::Config("session secret is not configured".to_string())
        })?;

        let now = Utc::now().timestamp().max(0) as u64;
        let expires_at = now + self.expiry_secs;
        let claims = SessionClaims::new(principal, now, expires_at);

        let token = encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| VerigateError::Config(format!("failed to sign session: {e}")))?;

        Ok(IssuedSession {
            token,
            expires_at,
            max_age_secs: self.expiry_secs,
        })
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("configured", &self.key.is_some())
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    const SECRET: &str = "test-secret";

    fn principal() -> SessionPrincipal {
        SessionPrincipal {
            id: 1,
            email: "user@example.org".to_string(),
            role: Role::Volunteer,
            is_admin: false,
        }
    }

    fn sign(secret: &str, claims: &SessionClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_expiring_in(secs: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims::new(&principal(), (now - 10) as u64, (now + secs) as u64)
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = SessionIssuer::new(Some(SECRET), 3600);
        let verifier = SessionVerifier::new(Some(SECRET));

        let session = issuer.issue(&principal()).unwrap();
        assert_eq!(session.max_age_secs, 3600);
        assert_eq!(verifier.verify(&session.token), Some(principal()));
    }

    #[test]
    fn test_wrong_secret_yields_none() {
        let token = sign("other-secret", &claims_expiring_in(3600));
        assert!(SessionVerifier::new(Some(SECRET)).verify(&token).is_none());
    }

    #[test]
    fn test_expired_yields_none() {
        let token = sign(SECRET, &claims_expiring_in(-1));
        assert!(SessionVerifier::new(Some(SECRET)).verify(&token).is_none());
    }

    #[test]
    fn test_missing_secret_fails_closed() {
        let token = sign(SECRET, &claims_expiring_in(3600));

        let verifier = SessionVerifier::new(None);
        assert!(!verifier.is_configured());
        assert!(verifier.verify(&token).is_none());

        let verifier = SessionVerifier::new(Some(""));
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn test_malformed_tokens_yield_none() {
        let verifier = SessionVerifier::new(Some(SECRET));
        assert!(verifier.verify("").is_none());
        assert!(verifier.verify("not-a-jwt").is_none());
        assert!(verifier.verify("a.b.c").is_none());
    }

    #[test]
    fn test_unknown_role_yields_none() {
        let mut claims = claims_expiring_in(3600);
        claims.role = "root".to_string();
        let token = sign(SECRET, &claims);
        assert!(SessionVerifier::new(Some(SECRET)).verify(&token).is_none());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims_expiring_in(3600),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(SessionVerifier::new(Some(SECRET)).verify(&token).is_none());
    }

    #[test]
    fn test_issuer_without_secret_errors() {
        let issuer = SessionIssuer::new(None, 3600);
        assert!(matches!(
            issuer.issue(&principal()),
            Err(VerigateError::Config(_))
        ));
    }
}
