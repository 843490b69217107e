//! Dashboard statistics

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DashboardStats {
    /// Sum of total copies over the catalog
    pub total_books: i64,
    /// Sum of available copies over the catalog
    pub available_books: i64,
    pub total_members: i64,
    /// Loans with status issued
    pub active_transactions: i64,
    /// Loans with status overdue
    pub overdue_transactions: i64,
    #[schema(value_type = String)]
    pub total_fines: Decimal,
    #[schema(value_type = String)]
    pub unpaid_fines: Decimal,
    /// Pending reservations
    pub total_reservations: i64,
    pub pending_requests: i64,
}

/// Circulation summary of one member
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MemberStats {
    pub user_id: i32,
    /// Every loan ever issued to the member
    pub total_borrowed: i64,
    /// Loans not yet returned
    pub currently_borrowed: i64,
    /// Unreturned loans past their due date
    pub overdue: i64,
    #[schema(value_type = String)]
    pub total_fines: Decimal,
    #[schema(value_type = String)]
    pub unpaid_fines: Decimal,
}
