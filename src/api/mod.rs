//! API handlers for the circulation REST endpoints

pub mod books;
pub mod borrow_requests;
pub mod fines;
pub mod health;
pub mod members;
pub mod openapi;
pub mod reservations;
pub mod stats;
pub mod transactions;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppError, models::ActorClaims, AppState};

/// Extractor for the authenticated actor from the bearer token
pub struct AuthenticatedUser(pub ActorClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = ActorClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Success envelope returned by every mutating endpoint
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    BookAction = ActionResponse<crate::models::Book>,
    TransactionAction = ActionResponse<crate::models::Transaction>,
    ReturnAction = ActionResponse<crate::models::transaction::ReturnOutcome>,
    FineAction = ActionResponse<crate::models::Fine>,
    SyncAction = ActionResponse<crate::models::fine::SyncReport>,
    ReservationAction = ActionResponse<crate::models::Reservation>,
    BorrowRequestAction = ActionResponse<crate::models::BorrowRequest>,
    ApprovalAction = ActionResponse<borrow_requests::ApprovalOutcome>,
    BatchAction = ActionResponse<BatchResult>
)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Envelope of a mutation that returns no data
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionMessage {
    pub success: bool,
    pub message: String,
}

impl<T> ActionResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ActionResponse<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Number of records touched by a batch operation
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResult {
    pub updated: u64,
}

/// Optional member filter for listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserScope {
    /// Restrict to one member; staff only when omitted
    pub user_id: Option<i32>,
}

/// Build the API router: `/api/v1` routes plus the OpenAPI documentation
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/search", get(books::search_books))
        .route("/books/available", get(books::available_books))
        .route("/books/genres", get(books::list_genres))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/borrow", post(transactions::borrow_book))
        // Loans
        .route(
            "/transactions",
            get(transactions::list_all).post(transactions::issue_book),
        )
        .route("/transactions/active", get(transactions::list_active))
        .route("/transactions/overdue", get(transactions::list_overdue))
        .route("/transactions/mark-overdue", post(transactions::mark_overdue))
        .route("/transactions/:id", get(transactions::get_transaction))
        .route("/transactions/:id/return", post(transactions::return_book))
        // Fines
        .route("/fines", get(fines::list_all))
        .route("/fines/unpaid", get(fines::list_unpaid))
        .route("/fines/total", get(fines::total_unpaid))
        .route("/fines/sync", post(fines::sync_overdue))
        .route("/fines/:id/pay", post(fines::pay_fine))
        // Reservations
        .route(
            "/reservations",
            get(reservations::list_all).post(reservations::create_reservation),
        )
        .route("/reservations/pending", get(reservations::list_pending))
        .route("/reservations/expire", post(reservations::expire_reservations))
        .route("/reservations/:id/fulfill", post(reservations::fulfill_reservation))
        .route("/reservations/:id/cancel", post(reservations::cancel_reservation))
        // Borrow requests
        .route(
            "/borrow-requests",
            get(borrow_requests::list_all).post(borrow_requests::create_request),
        )
        .route("/borrow-requests/pending", get(borrow_requests::list_pending))
        .route("/borrow-requests/:id/approve", post(borrow_requests::approve_request))
        .route("/borrow-requests/:id/reject", post(borrow_requests::reject_request))
        .route("/borrow-requests/:id/cancel", post(borrow_requests::cancel_request))
        // Member records
        .route("/users/lookup", get(members::lookup_member))
        .route("/users/:id/stats", get(stats::member_stats))
        .route("/users/:id/transactions", get(transactions::user_transactions))
        .route("/users/:id/fines", get(fines::user_fines))
        .route("/users/:id/reservations", get(reservations::user_reservations))
        .route("/users/:id/borrow-requests", get(borrow_requests::user_requests))
        // Statistics
        .route("/stats", get(stats::dashboard))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
