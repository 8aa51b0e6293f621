//! Email verification handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::verification::RESEND_MESSAGE;
use crate::verification::VERIFIED_MESSAGE;
use crate::web::dto::{MessageResponse, ResendVerificationRequest, ValidatedJson, VerifyEmailQuery};
use crate::web::error::ApiError;

/// POST /verification/resend
///
/// The same message is returned whether the address is unknown, already
/// verified, or was sent a new link.
pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let outcome = state.verification.resend_verification(&req.email).await?;
    tracing::debug!(?outcome, "Resend handled");
    Ok(Json(MessageResponse::new(RESEND_MESSAGE)))
}

/// GET /verification/verify?token=
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing token parameter"))?;

    let verified = state.verification.verify_email_token(&token).await?;
    tracing::info!(user_id = verified.user_id, "Email verified");
    Ok(Json(MessageResponse::new(VERIFIED_MESSAGE)))
}
