//! Role-based access checks on top of session principals.

use super::principal::SessionPrincipal;
use crate::db::Role;
use crate::{Result, VerigateError};

/// Roles allowed on staff-only endpoints.
pub const STAFF_ROLES: &[Role] = &[Role::Volunteer, Role::Admin];

/// Require a principal whose role is in `allowed`.
///
/// No principal is `Unauthorized`; a principal with another role is
/// `Forbidden`. Admins always pass.
pub fn require_role<'a>(
    principal: Option<&'a SessionPrincipal>,
    allowed: &[Role],
) -> Result<&'a SessionPrincipal> {
    let principal = principal
        .ok_or_else(|| VerigateError::Unauthorized("authentication required".to_string()))?;

    if principal.has_any_role(allowed) {
        Ok(principal)
    } else {
        Err(VerigateError::Forbidden(format!(
            "role {} may not access this resource",
            principal.role
        )))
    }
}
