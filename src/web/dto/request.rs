//! Request DTOs.

use serde::Deserialize;
use validator::Validate;

use super::validation::not_empty_trimmed;

/// `POST /verification/resend`
#[derive(Debug, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
}

/// `GET /verification/verify?token=`
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// `POST /auth/login`
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_empty_trimmed"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// `POST /auth/register`
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
    #[serde(default)]
    pub is_volunteer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resend_request_validation() {
        let ok: ResendVerificationRequest =
            serde_json::from_str(r#"{"email":"a@example.org"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let bad: ResendVerificationRequest =
            serde_json::from_str(r#"{"email":"nope"}"#).unwrap();
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_register_request_defaults() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@example.org","password":"password123"}"#)
                .unwrap();
        assert!(!req.is_volunteer);
        assert!(req.validate().is_ok());

        let short: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@example.org","password":"short"}"#).unwrap();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_login_request_requires_fields() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"  ","password":""}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_verify_query_token_optional() {
        let q: VerifyEmailQuery = serde_json::from_str("{}").unwrap();
        assert!(q.token.is_none());
    }
}
