//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrow_requests, fines, health, members, reservations, stats, transactions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Circulation API",
        version = "1.0.0",
        description = "Library circulation REST API: loans, fines, reservations and borrow requests",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        books::list_books,
        books::search_books,
        books::available_books,
        books::list_genres,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        transactions::issue_book,
        transactions::borrow_book,
        transactions::return_book,
        transactions::get_transaction,
        transactions::user_transactions,
        transactions::list_active,
        transactions::list_all,
        transactions::list_overdue,
        transactions::mark_overdue,
        // Fines
        fines::user_fines,
        fines::list_all,
        fines::list_unpaid,
        fines::total_unpaid,
        fines::sync_overdue,
        fines::pay_fine,
        // Reservations
        reservations::create_reservation,
        reservations::fulfill_reservation,
        reservations::cancel_reservation,
        reservations::expire_reservations,
        reservations::user_reservations,
        reservations::list_all,
        reservations::list_pending,
        // Borrow requests
        borrow_requests::create_request,
        borrow_requests::approve_request,
        borrow_requests::reject_request,
        borrow_requests::cancel_request,
        borrow_requests::user_requests,
        borrow_requests::list_pending,
        borrow_requests::list_all,
        // Members
        members::lookup_member,
        // Stats
        stats::dashboard,
        stats::member_stats,
    ),
    components(
        schemas(
            // Catalog
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookPage,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::Availability,
            // Profiles
            crate::models::profile::Role,
            crate::models::profile::ProfileShort,
            // Loans
            crate::models::transaction::Transaction,
            crate::models::transaction::TransactionStatus,
            crate::models::transaction::TransactionDetails,
            crate::models::transaction::IssueBook,
            crate::models::transaction::ReturnOutcome,
            crate::api::BatchResult,
            // Fines
            crate::models::fine::Fine,
            crate::models::fine::FineDetails,
            crate::models::fine::PayFine,
            crate::models::fine::SyncReport,
            fines::FineTotal,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::CreateReservation,
            // Borrow requests
            crate::models::borrow_request::BorrowRequest,
            crate::models::borrow_request::BorrowRequestStatus,
            crate::models::borrow_request::BorrowRequestDetails,
            crate::models::borrow_request::CreateBorrowRequest,
            crate::models::borrow_request::RejectBorrowRequest,
            borrow_requests::ApprovalOutcome,
            // Stats
            crate::models::stats::DashboardStats,
            crate::models::stats::MemberStats,
            // Health
            health::HealthResponse,
            // Envelopes
            crate::api::ActionMessage,
            crate::api::BookAction,
            crate::api::TransactionAction,
            crate::api::ReturnAction,
            crate::api::FineAction,
            crate::api::SyncAction,
            crate::api::ReservationAction,
            crate::api::BorrowRequestAction,
            crate::api::ApprovalAction,
            crate::api::BatchAction,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorKind,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog"),
        (name = "transactions", description = "Issue, borrow and return"),
        (name = "fines", description = "Overdue fines"),
        (name = "reservations", description = "Reservation queue"),
        (name = "borrow-requests", description = "Member borrow requests"),
        (name = "members", description = "Member lookup"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
