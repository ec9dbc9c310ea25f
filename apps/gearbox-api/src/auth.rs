//! Staff identity extractors.
//!
//! The counter terminals identify the logged-in staff member with the
//! `x-staff-id` header. Handlers ask for [`CurrentStaff`] (any active staff
//! member) or [`AdminStaff`] (admins only) and the extractor does the lookup.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::{debug, warn};

use gearbox_core::Staff;

use crate::error::ApiError;
use crate::AppState;

pub const STAFF_HEADER: &str = "x-staff-id";

/// An active staff member.
#[derive(Debug, Clone)]
pub struct CurrentStaff(pub Staff);

/// An active staff member with the admin role.
#[derive(Debug, Clone)]
pub struct AdminStaff(pub Staff);

impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(staff) = parts.extensions.get::<CurrentStaff>() {
            return Ok(staff.clone());
        }

        let staff_id = parts
            .headers
            .get(STAFF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Staff identification required"))?;

        let staff = match state.db.staff().get_active(staff_id).await? {
            Some(staff) => staff,
            None => {
                warn!(staff_id = %staff_id, uri = %parts.uri, "Unknown or inactive staff id");
                return Err(ApiError::unauthorized("Unknown or inactive staff member"));
            }
        };

        debug!(staff_id = %staff.id, role = ?staff.role, "Staff identified");

        let current = CurrentStaff(staff);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

impl FromRequestParts<AppState> for AdminStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentStaff(staff) = CurrentStaff::from_request_parts(parts, state).await?;

        if !staff.is_admin() {
            warn!(staff_id = %staff.id, uri = %parts.uri, "Admin route refused");
            return Err(ApiError::forbidden("Admin access required"));
        }

        Ok(AdminStaff(staff))
    }
}
