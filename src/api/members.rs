//! Member lookup for the issue desk

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::AuthenticatedUser;
use crate::{error::AppResult, models::ProfileShort, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MemberLookup {
    /// Member card number or email
    pub q: String,
}

/// Find a member by card number or email
#[utoipa::path(
    get,
    path = "/users/lookup",
    tag = "members",
    security(("bearer_auth" = [])),
    params(MemberLookup),
    responses(
        (status = 200, description = "Matching member", body = ProfileShort),
        (status = 400, description = "Empty search", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse),
        (status = 404, description = "No member matches", body = crate::error::ErrorResponse)
    )
)]
pub async fn lookup_member(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MemberLookup>,
) -> AppResult<Json<ProfileShort>> {
    let member = state.services.circulation.find_member(&claims, &query.q).await?;
    Ok(Json(member))
}
