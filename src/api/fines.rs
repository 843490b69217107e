//! Fine endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::{ActionResponse, AuthenticatedUser, UserScope};
use crate::{
    error::AppResult,
    models::fine::{Fine, FineDetails, PayFine, SyncReport},
    AppState,
};

/// Unpaid total
#[derive(Serialize, ToSchema)]
pub struct FineTotal {
    pub user_id: Option<i32>,
    #[schema(value_type = String)]
    pub total: Decimal,
}

/// Fines of a member
#[utoipa::path(
    get,
    path = "/users/{id}/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member profile ID")
    ),
    responses(
        (status = 200, description = "Fines, newest first", body = Vec<FineDetails>),
        (status = 403, description = "Not your records", body = crate::error::ErrorResponse)
    )
)]
pub async fn user_fines(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<FineDetails>>> {
    let fines = state.services.fines.user_fines(&claims, user_id).await?;
    Ok(Json(fines))
}

/// Every fine
#[utoipa::path(
    get,
    path = "/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fines, newest first", body = Vec<FineDetails>),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<FineDetails>>> {
    let fines = state.services.fines.all_fines(&claims).await?;
    Ok(Json(fines))
}

/// Unpaid fines
#[utoipa::path(
    get,
    path = "/fines/unpaid",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(UserScope),
    responses(
        (status = 200, description = "Unpaid fines, oldest first", body = Vec<FineDetails>)
    )
)]
pub async fn list_unpaid(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(scope): Query<UserScope>,
) -> AppResult<Json<Vec<FineDetails>>> {
    let fines = state.services.fines.unpaid_fines(&claims, scope.user_id).await?;
    Ok(Json(fines))
}

/// Sum of unpaid fines
#[utoipa::path(
    get,
    path = "/fines/total",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(UserScope),
    responses(
        (status = 200, description = "Unpaid total", body = FineTotal)
    )
)]
pub async fn total_unpaid(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(scope): Query<UserScope>,
) -> AppResult<Json<FineTotal>> {
    let total = state.services.fines.total_unpaid(&claims, scope.user_id).await?;
    Ok(Json(FineTotal {
        user_id: scope.user_id,
        total,
    }))
}

/// Recompute fines of overdue loans
#[utoipa::path(
    post,
    path = "/fines/sync",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(UserScope),
    responses(
        (status = 200, description = "Synchronization report", body = super::SyncAction)
    )
)]
pub async fn sync_overdue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(scope): Query<UserScope>,
) -> AppResult<Json<ActionResponse<SyncReport>>> {
    let report = state.services.fines.sync_overdue(&claims, scope.user_id).await?;
    Ok(Json(ActionResponse::ok("Overdue fines synchronized", report)))
}

/// Pay a fine
#[utoipa::path(
    post,
    path = "/fines/{id}/pay",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    request_body = PayFine,
    responses(
        (status = 200, description = "Fine paid", body = super::FineAction),
        (status = 404, description = "Fine not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Fine already paid", body = crate::error::ErrorResponse)
    )
)]
pub async fn pay_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Option<Json<PayFine>>,
) -> AppResult<Json<ActionResponse<Fine>>> {
    let method = body.and_then(|Json(b)| b.payment_method);
    let fine = state.services.fines.pay(&claims, id, method).await?;
    Ok(Json(ActionResponse::ok("Fine paid successfully", fine)))
}
