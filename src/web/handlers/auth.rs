//! Login, logout, registration and session lookup.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::AppState;
use crate::auth::{LoginAttempt, RegistrationRequest, SessionPrincipal, REGISTERED_MESSAGE};
use crate::web::dto::{
    ApiResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{ClientMeta, SessionUser};

/// POST /auth/login
///
/// Sets the session cookie and also returns the token for bearer clients.
pub async fn login(
    State(state): State<Arc<AppState>>,
    client: ClientMeta,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    let outcome = state
        .login
        .login(LoginAttempt {
            email: &req.email,
            password: &req.password,
            ip_address: &client.ip,
            user_agent: &client.user_agent,
        })
        .await?;

    let max_age = i64::try_from(outcome.session.max_age_secs).unwrap_or(i64::MAX);
    let cookie = Cookie::build((state.session.cookie_name.clone(), outcome.session.token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.session.cookie_secure)
        .same_site(SameSite::Strict)
        .max_age(TimeDuration::seconds(max_age));

    let body = LoginResponse {
        token: outcome.session.token,
        expires_at: outcome.session.expires_at,
        user: outcome.principal,
    };

    Ok((jar.add(cookie), Json(ApiResponse::new(body))))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let removal = Cookie::build((state.session.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(TimeDuration::ZERO);

    (jar.add(removal), Json(MessageResponse::new("Logged out")))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .registration
        .register(RegistrationRequest {
            email: &req.email,
            password: &req.password,
            is_volunteer: req.is_volunteer,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(REGISTERED_MESSAGE)),
    ))
}

/// GET /auth/me
pub async fn me(SessionUser(principal): SessionUser) -> Json<ApiResponse<SessionPrincipal>> {
    Json(ApiResponse::new(principal))
}
