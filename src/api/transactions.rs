//! Loan endpoints: issue, self-borrow, return and listings

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{ActionResponse, AuthenticatedUser, BatchResult, TransactionAction, UserScope};
use crate::{
    error::AppResult,
    models::transaction::{IssueBook, ReturnOutcome, Transaction, TransactionDetails},
    AppState,
};

/// Issue a book to a member
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    request_body = IssueBook,
    responses(
        (status = 201, description = "Book issued", body = TransactionAction),
        (status = 400, description = "Due date in the past", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or member not found", body = crate::error::ErrorResponse),
        (status = 409, description = "No copy available or already issued", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<IssueBook>,
) -> AppResult<(StatusCode, Json<ActionResponse<Transaction>>)> {
    let transaction = state.services.circulation.issue_book(&claims, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("Book issued successfully", transaction)),
    ))
}

/// Borrow a book for yourself
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Book borrowed", body = TransactionAction),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "No copy available or already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<ActionResponse<Transaction>>)> {
    let transaction = state.services.circulation.borrow_book(&claims, book_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("Book borrowed successfully", transaction)),
    ))
}

/// Return a loan
#[utoipa::path(
    post,
    path = "/transactions/{id}/return",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Book returned, with any fine charged", body = super::ReturnAction),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse<ReturnOutcome>>> {
    let outcome = state.services.circulation.return_book(&claims, id).await?;
    let message = match outcome.fine {
        Some(ref fine) => format!("Book returned with a fine of {}", fine.amount),
        None => "Book returned successfully".to_string(),
    };
    Ok(Json(ActionResponse::ok(message, outcome)))
}

/// Get a loan
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Loan", body = Transaction),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Transaction>> {
    let transaction = state.services.circulation.get_transaction(&claims, id).await?;
    Ok(Json(transaction))
}

/// Loan history of a member
#[utoipa::path(
    get,
    path = "/users/{id}/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member profile ID")
    ),
    responses(
        (status = 200, description = "Loans, newest first", body = Vec<TransactionDetails>),
        (status = 403, description = "Not your records", body = crate::error::ErrorResponse)
    )
)]
pub async fn user_transactions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let loans = state.services.circulation.user_transactions(&claims, user_id).await?;
    Ok(Json(loans))
}

/// Unreturned loans
#[utoipa::path(
    get,
    path = "/transactions/active",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(UserScope),
    responses(
        (status = 200, description = "Active loans", body = Vec<TransactionDetails>)
    )
)]
pub async fn list_active(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(scope): Query<UserScope>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let loans = state.services.circulation.active_transactions(&claims, scope.user_id).await?;
    Ok(Json(loans))
}

/// Every loan, newest first
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loans", body = Vec<TransactionDetails>),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let loans = state.services.circulation.all_transactions(&claims).await?;
    Ok(Json(loans))
}

/// Unreturned loans past due
#[utoipa::path(
    get,
    path = "/transactions/overdue",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue loans, oldest due date first", body = Vec<TransactionDetails>),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_overdue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let loans = state.services.circulation.overdue_transactions(&claims).await?;
    Ok(Json(loans))
}

/// Flag loans past due as overdue
#[utoipa::path(
    post,
    path = "/transactions/mark-overdue",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Number of loans flagged", body = super::BatchAction),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_overdue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ActionResponse<BatchResult>>> {
    let updated = state.services.circulation.mark_overdue(&claims).await?;
    Ok(Json(ActionResponse::ok(
        format!("{} loans marked overdue", updated),
        BatchResult { updated },
    )))
}
