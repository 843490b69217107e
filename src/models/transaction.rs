//! Transaction (loan) model and its status machine

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;
use super::fine::calculate_fine;
use super::profile::ProfileShort;
use super::text_enum;
use crate::error::{AppError, AppResult};

/// Loan status
///
/// `issued -> returned | overdue` on return, and `issued -> overdue` when a
/// loan passes its due date without being returned. An unreturned overdue
/// loan may still be returned later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Issued,
    Returned,
    Overdue,
}

text_enum!(TransactionStatus {
    Issued => "issued",
    Returned => "returned",
    Overdue => "overdue",
});

/// Due date of a loan issued at `issued_at`
pub fn due_date_from(issued_at: DateTime<Utc>, loan_period_days: i64) -> DateTime<Utc> {
    issued_at + Duration::days(loan_period_days)
}

/// Loan record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub issued_by: Option<i32>,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned_by: Option<i32>,
    pub status: TransactionStatus,
    #[schema(value_type = String)]
    pub fine_amount: Decimal,
    pub fine_paid: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal state computed for a loan being returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub status: TransactionStatus,
    pub fine_amount: Decimal,
    pub days_overdue: i64,
}

impl Transaction {
    /// A loan holds a copy until it has a return date
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn days_overdue(&self, reference: DateTime<Utc>) -> i64 {
        (reference - self.due_date).num_days().max(0)
    }

    /// Settle the loan at `now`: the final status and fine
    pub fn settle(&self, now: DateTime<Utc>, fine_per_day: Decimal) -> AppResult<Settlement> {
        if !self.is_active() {
            return Err(AppError::AlreadyReturned(self.id));
        }
        let status = if now > self.due_date {
            TransactionStatus::Overdue
        } else {
            TransactionStatus::Returned
        };
        Ok(Settlement {
            status,
            fine_amount: calculate_fine(self.due_date, now, fine_per_day),
            days_overdue: self.days_overdue(now),
        })
    }

    /// Running fine of an unreturned loan at `now`, if it is past due
    pub fn accrued_fine(&self, now: DateTime<Utc>, fine_per_day: Decimal) -> Option<Decimal> {
        if self.is_active() && now > self.due_date {
            Some(calculate_fine(self.due_date, now, fine_per_day))
        } else {
            None
        }
    }
}

/// Loan with its book and borrower for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub book: BookShort,
    pub user: ProfileShort,
}

/// Fields of a loan about to be inserted
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub book_id: i32,
    pub user_id: i32,
    pub issued_by: i32,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Librarian issue request
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueBook {
    pub book_id: i32,
    /// Borrower profile ID
    pub user_id: i32,
    /// Overrides the default loan period
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Result of a return
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub transaction: Transaction,
    /// Unpaid fine created or updated by this return
    pub fine: Option<super::fine::Fine>,
}

#[cfg(test)]
pub(crate) fn test_loan(due_date: DateTime<Utc>) -> Transaction {
    Transaction {
        id: 11,
        book_id: 1,
        user_id: 7,
        issued_by: Some(2),
        issue_date: due_date - Duration::days(14),
        due_date,
        return_date: None,
        returned_by: None,
        status: TransactionStatus::Issued,
        fine_amount: Decimal::ZERO,
        fine_paid: false,
        notes: None,
        created_at: due_date - Duration::days(14),
        updated_at: due_date - Duration::days(14),
    }
}
