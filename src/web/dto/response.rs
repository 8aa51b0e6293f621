//! Response DTOs.

use serde::Serialize;

use crate::auth::SessionPrincipal;

/// Generic `{ "data": ... }` wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// `{ "message": ... }` body used by the verification and registration endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Login result. The token is also set as an HTTP-only cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix seconds.
    pub expires_at: u64,
    pub user: SessionPrincipal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    #[test]
    fn test_message_response() {
        let json = serde_json::to_value(MessageResponse::new("ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "ok" }));
    }

    #[test]
    fn test_login_response_shape() {
        let body = ApiResponse::new(LoginResponse {
            token: "t".to_string(),
            expires_at: 10,
            user: SessionPrincipal {
                id: 1,
                email: "a@example.org".to_string(),
                role: Role::Participant,
                is_admin: false,
            },
        });
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["data"]["token"], "t");
        assert_eq!(json["data"]["user"]["role"], "participant");
        assert_eq!(json["data"]["user"]["isAdmin"], false);
    }
}
