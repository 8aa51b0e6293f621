//! Staff-only statistics.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::auth::{require_role, STAFF_ROLES};
use crate::db::{LoginEventRepository, LoginStats};
use crate::web::dto::ApiResponse;
use crate::web::error::ApiError;
use crate::web::middleware::OptionalSessionUser;

/// GET /stats/login-events
pub async fn login_event_stats(
    State(state): State<Arc<AppState>>,
    OptionalSessionUser(principal): OptionalSessionUser,
) -> Result<Json<ApiResponse<LoginStats>>, ApiError> {
    require_role(principal.as_ref(), STAFF_ROLES)?;

    let stats = LoginEventRepository::new(state.db.pool()).stats().await?;
    Ok(Json(ApiResponse::new(stats)))
}
