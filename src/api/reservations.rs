//! Reservation queue endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{ActionResponse, AuthenticatedUser, BatchResult};
use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, Reservation, ReservationDetails},
    AppState,
};

/// Optional book filter for the pending queue
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookScope {
    pub book_id: Option<i32>,
}

/// Reserve a checked-out book
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation queued", body = super::ReservationAction),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is available or already reserved", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<ActionResponse<Reservation>>)> {
    let reservation = state.services.reservations.create(&claims, request).await?;
    let message = format!("Book reserved, position {} in queue", reservation.queue_position);
    Ok((StatusCode::CREATED, Json(ActionResponse::ok(message, reservation))))
}

/// Mark a reservation fulfilled
#[utoipa::path(
    post,
    path = "/reservations/{id}/fulfill",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation fulfilled", body = super::ReservationAction),
        (status = 404, description = "Reservation not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Reservation is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn fulfill_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse<Reservation>>> {
    let reservation = state.services.reservations.fulfill(&claims, id).await?;
    Ok(Json(ActionResponse::ok("Reservation fulfilled", reservation)))
}

/// Cancel a reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = super::ReservationAction),
        (status = 404, description = "Reservation not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Reservation is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse<Reservation>>> {
    let reservation = state.services.reservations.cancel(&claims, id).await?;
    Ok(Json(ActionResponse::ok("Reservation cancelled", reservation)))
}

/// Expire stale reservations
#[utoipa::path(
    post,
    path = "/reservations/expire",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Number of reservations expired", body = super::BatchAction)
    )
)]
pub async fn expire_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ActionResponse<BatchResult>>> {
    let updated = state.services.reservations.expire(&claims).await?;
    Ok(Json(ActionResponse::ok(
        format!("{} reservations expired", updated),
        BatchResult { updated },
    )))
}

/// Reservations of a member
#[utoipa::path(
    get,
    path = "/users/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member profile ID")
    ),
    responses(
        (status = 200, description = "Reservations, newest first", body = Vec<ReservationDetails>)
    )
)]
pub async fn user_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.user_reservations(&claims, user_id).await?;
    Ok(Json(reservations))
}

/// Every reservation
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reservations, newest first", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_all(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.all_reservations(&claims).await?;
    Ok(Json(reservations))
}

/// Pending queue
#[utoipa::path(
    get,
    path = "/reservations/pending",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(BookScope),
    responses(
        (status = 200, description = "Pending reservations in queue order", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_pending(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(scope): Query<BookScope>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state
        .services
        .reservations
        .pending_reservations(&claims, scope.book_id)
        .await?;
    Ok(Json(reservations))
}
