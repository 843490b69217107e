//! Statistics endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use super::AuthenticatedUser;
use crate::{
    error::AppResult,
    models::stats::{DashboardStats, MemberStats},
    AppState,
};

/// Circulation dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard(&claims).await?;
    Ok(Json(stats))
}

/// Loan and fine summary of a member
#[utoipa::path(
    get,
    path = "/users/{id}/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member profile ID")
    ),
    responses(
        (status = 200, description = "Member statistics", body = MemberStats),
        (status = 403, description = "Not your records", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn member_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<MemberStats>> {
    let stats = state.services.stats.member(&claims, user_id).await?;
    Ok(Json(stats))
}
