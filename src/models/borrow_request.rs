//! Borrow requests awaiting librarian review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookShort;
use super::profile::ProfileShort;
use super::text_enum;
use crate::error::{AppError, AppResult};

pub const DEFAULT_REJECTION_REASON: &str = "Request rejected by librarian";

/// `pending -> approved | rejected | cancelled`, all terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowRequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

text_enum!(BorrowRequestStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Cancelled => "cancelled",
});

impl BorrowRequestStatus {
    /// Validate a review or cancellation of a request currently in `self`
    pub fn transition(self, to: BorrowRequestStatus) -> AppResult<BorrowRequestStatus> {
        match (self, to) {
            (BorrowRequestStatus::Pending, BorrowRequestStatus::Pending) => Err(
                AppError::InvalidState("Request is already pending".to_string()),
            ),
            (BorrowRequestStatus::Pending, next) => Ok(next),
            (current, next) => Err(AppError::InvalidState(format!(
                "Only pending requests can be {}, this one is {}",
                next, current
            ))),
        }
    }
}

/// Borrow request record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRequest {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub request_date: DateTime<Utc>,
    pub requested_due_date: DateTime<Utc>,
    pub status: BorrowRequestStatus,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Borrow request with its book and member for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowRequestDetails {
    #[serde(flatten)]
    pub request: BorrowRequest,
    pub book: BookShort,
    pub user: ProfileShort,
}

/// Create borrow request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowRequest {
    pub book_id: i32,
    #[validate(length(max = 1000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

/// Reject borrow request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectBorrowRequest {
    pub reason: Option<String>,
}
