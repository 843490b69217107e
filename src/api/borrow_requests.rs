//! Borrow-request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ActionResponse, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::{
        borrow_request::{BorrowRequest, BorrowRequestDetails, CreateBorrowRequest, RejectBorrowRequest},
        transaction::Transaction,
    },
    AppState,
};

/// Approved request and the loan it issued
#[derive(Serialize, ToSchema)]
pub struct ApprovalOutcome {
    pub request: BorrowRequest,
    pub transaction: Transaction,
}

/// Request to borrow a book
#[utoipa::path(
    post,
    path = "/borrow-requests",
    tag = "borrow-requests",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowRequest,
    responses(
        (status = 201, description = "Request filed", body = super::BorrowRequestAction),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already requested or borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowRequest>,
) -> AppResult<(StatusCode, Json<ActionResponse<BorrowRequest>>)> {
    let request = state.services.borrow_requests.create(&claims, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("Borrow request submitted", request)),
    ))
}

/// Approve a request and issue the book
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/approve",
    tag = "borrow-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow request ID")
    ),
    responses(
        (status = 200, description = "Request approved and book issued", body = super::ApprovalAction),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not pending or no copy available", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse<ApprovalOutcome>>> {
    let (request, transaction) = state.services.borrow_requests.approve(&claims, id).await?;
    Ok(Json(ActionResponse::ok(
        "Borrow request approved",
        ApprovalOutcome { request, transaction },
    )))
}

/// Reject a request
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/reject",
    tag = "borrow-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow request ID")
    ),
    request_body = RejectBorrowRequest,
    responses(
        (status = 200, description = "Request rejected", body = super::BorrowRequestAction),
        (status = 409, description = "Request is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Option<Json<RejectBorrowRequest>>,
) -> AppResult<Json<ActionResponse<BorrowRequest>>> {
    let reject = body.map(|Json(b)| b).unwrap_or_default();
    let request = state.services.borrow_requests.reject(&claims, id, reject).await?;
    Ok(Json(ActionResponse::ok("Borrow request rejected", request)))
}

/// Withdraw your own request
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/cancel",
    tag = "borrow-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = super::BorrowRequestAction),
        (status = 403, description = "Not the requester", body = crate::error::ErrorResponse),
        (status = 409, description = "Request is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse<BorrowRequest>>> {
    let request = state.services.borrow_requests.cancel(&claims, id).await?;
    Ok(Json(ActionResponse::ok("Borrow request cancelled", request)))
}

/// Requests of a member
#[utoipa::path(
    get,
    path = "/users/{id}/borrow-requests",
    tag = "borrow-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member profile ID")
    ),
    responses(
        (status = 200, description = "Requests, newest first", body = Vec<BorrowRequestDetails>)
    )
)]
pub async fn user_requests(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowRequestDetails>>> {
    let requests = state.services.borrow_requests.user_requests(&claims, user_id).await?;
    Ok(Json(requests))
}

/// Review queue
#[utoipa::path(
    get,
    path = "/borrow-requests/pending",
    tag = "borrow-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending requests, oldest first", body = Vec<BorrowRequestDetails>)
    )
)]
pub async fn list_pending(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRequestDetails>>> {
    let requests = state.services.borrow_requests.pending_requests(&claims).await?;
    Ok(Json(requests))
}

/// Every request
#[utoipa::path(
    get,
    path = "/borrow-requests",
    tag = "borrow-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requests, newest first", body = Vec<BorrowRequestDetails>)
    )
)]
pub async fn list_all(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRequestDetails>>> {
    let requests = state.services.borrow_requests.all_requests(&claims).await?;
    Ok(Json(requests))
}
