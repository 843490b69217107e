//! Fine model and the fine calculator

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;
use super::profile::ProfileShort;

/// Fine for `reference` against `due`: whole days past due times the
/// daily rate. Partial days are truncated, never rounded up.
pub fn calculate_fine(due: DateTime<Utc>, reference: DateTime<Utc>, fine_per_day: Decimal) -> Decimal {
    let days_overdue = (reference - due).num_days();
    if days_overdue <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(days_overdue) * fine_per_day
}

/// Amount still to charge on a loan once earlier payments are deducted
pub fn outstanding(total_due: Decimal, already_paid: Decimal) -> Decimal {
    (total_due - already_paid).max(Decimal::ZERO)
}

/// Human readable reason stored on the fine
pub fn overdue_reason(title: &str, days: i64) -> String {
    format!("Overdue fine for \"{}\" ({} days late)", title, days)
}

/// Fine record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub id: i32,
    pub transaction_id: i32,
    pub user_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub reason: String,
    pub paid: bool,
    pub paid_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fine with its loan, book and member for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FineDetails {
    #[serde(flatten)]
    pub fine: Fine,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub book: BookShort,
    pub user: ProfileShort,
}

/// Pay fine request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayFine {
    /// Defaults to "cash"
    pub payment_method: Option<String>,
}

/// Outcome of an overdue fine synchronization pass
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct SyncReport {
    /// Unreturned loans found past their due date
    pub overdue_loans: u64,
    /// Unpaid fines inserted or updated
    pub fines_upserted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn rate() -> Decimal {
        Decimal::from(10)
    }

    #[test]
    fn test_four_days_late() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let returned = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(calculate_fine(due, returned, rate()), Decimal::from(40));
    }

    #[test]
    fn test_not_late() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(calculate_fine(due, due, rate()), Decimal::ZERO);
        assert_eq!(calculate_fine(due, due - Duration::days(3), rate()), Decimal::ZERO);
    }

    #[test]
    fn test_partial_days_truncate() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(calculate_fine(due, due + Duration::hours(23), rate()), Decimal::ZERO);
        assert_eq!(calculate_fine(due, due + Duration::hours(47), rate()), Decimal::from(10));
    }

    #[test]
    fn test_monotonic_after_due() {
        let due = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut previous = Decimal::ZERO;
        for hours in (0..24 * 40).step_by(7) {
            let fine = calculate_fine(due, due + Duration::hours(hours), rate());
            assert!(fine >= previous);
            previous = fine;
        }
    }

    #[test]
    fn test_outstanding_never_negative() {
        assert_eq!(outstanding(Decimal::from(50), Decimal::from(30)), Decimal::from(20));
        assert_eq!(outstanding(Decimal::from(30), Decimal::from(30)), Decimal::ZERO);
        assert_eq!(outstanding(Decimal::from(10), Decimal::from(30)), Decimal::ZERO);
    }
}
