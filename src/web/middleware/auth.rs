//! Session extraction for handlers.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::auth::{SessionPrincipal, SessionVerifier};
use crate::web::error::ApiError;

/// Verifier and cookie name, injected into request extensions by [`session_auth`].
#[derive(Debug, Clone)]
pub struct SessionState {
    pub verifier: Arc<SessionVerifier>,
    pub cookie_name: String,
}

impl SessionState {
    pub fn new(verifier: Arc<SessionVerifier>, cookie_name: impl Into<String>) -> Self {
        Self {
            verifier,
            cookie_name: cookie_name.into(),
        }
    }

    /// Raw token from the session cookie, else from `Authorization: Bearer`.
    pub fn raw_token(&self, headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(&self.cookie_name) {
            if !cookie.value().is_empty() {
                return Some(cookie.value().to_string());
            }
        }

        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    fn principal(&self, headers: &HeaderMap) -> Result<SessionPrincipal, ApiError> {
        let token = self
            .raw_token(headers)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        self.verifier
            .verify(&token)
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))
    }
}

/// Authenticated principal. Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct SessionUser(pub SessionPrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<SessionState>>()
            .ok_or_else(|| ApiError::internal("Session state not configured"))?;

        state.principal(&parts.headers).map(SessionUser)
    }
}

/// Principal if the request carries a valid session.
#[derive(Debug, Clone)]
pub struct OptionalSessionUser(pub Option<SessionPrincipal>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalSessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Arc<SessionState>>()
            .and_then(|state| state.principal(&parts.headers).ok());
        Ok(OptionalSessionUser(principal))
    }
}

/// Insert the session state into request extensions.
pub async fn session_auth(
    state: Arc<SessionState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state);
    next.run(request).await
}
