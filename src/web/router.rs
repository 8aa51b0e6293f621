//! Router assembly.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    login, login_event_stats, logout, me, register, resend_verification, verify_email, AppState,
};
use super::middleware::{create_cors_layer, ip_rate_limit, session_auth, RateLimitState, SessionState};

/// Build the API router.
///
/// `/auth/*` and `/verification/*` sit behind the per-IP limiter.
pub fn create_router(
    app_state: Arc<AppState>,
    session_state: Arc<SessionState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/register", post(register))
        .route("/me", get(me));

    let verification_routes = Router::new()
        .route("/resend", post(resend_verification))
        .route("/verify", get(verify_email));

    let limiter = rate_limit.clone();
    let throttled = Router::new()
        .nest("/auth", auth_routes)
        .nest("/verification", verification_routes)
        .layer(middleware::from_fn(move |req, next| {
            let state = limiter.clone();
            ip_rate_limit(state, req, next)
        }));

    let stats_routes = Router::new().route("/login-events", get(login_event_stats));

    Router::new()
        .merge(throttled)
        .nest("/stats", stats_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = session_state.clone();
                    session_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// `/health` router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
