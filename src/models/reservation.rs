//! Reservation queue model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;
use super::profile::ProfileShort;
use super::text_enum;
use crate::error::{AppError, AppResult};

/// Reservation status; every state but `pending` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Fulfilled,
    Cancelled,
    Expired,
}

text_enum!(ReservationStatus {
    Pending => "pending",
    Fulfilled => "fulfilled",
    Cancelled => "cancelled",
    Expired => "expired",
});

impl ReservationStatus {
    pub fn ensure_pending(&self) -> AppResult<()> {
        if *self == ReservationStatus::Pending {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!("Reservation is {}, not pending", self)))
        }
    }
}

/// Queue positions are creation-order labels: append after the pending ones.
/// Cancelled and expired entries leave gaps, nothing is renumbered.
pub fn next_queue_position(pending_count: i64) -> i32 {
    pending_count as i32 + 1
}

pub fn expiry_from(created_at: DateTime<Utc>, hold_days: i64) -> DateTime<Utc> {
    created_at + Duration::days(hold_days)
}

/// Reservation record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub reservation_date: DateTime<Utc>,
    pub status: ReservationStatus,
    pub expiry_date: DateTime<Utc>,
    pub fulfilled_date: Option<DateTime<Utc>>,
    pub queue_position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Pending && self.expiry_date < now
    }
}

/// Reservation with its book and member for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub book: BookShort,
    pub user: ProfileShort,
}

/// Create reservation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservation {
    pub book_id: i32,
    /// Staff may reserve on behalf of a member; defaults to the caller
    pub user_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_positions_append() {
        assert_eq!(next_queue_position(0), 1);
        assert_eq!(next_queue_position(4), 5);
    }

    #[test]
    fn test_expiry_and_pending_gate() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let expiry = expiry_from(created, 3);
        assert_eq!(expiry, Utc.with_ymd_and_hms(2024, 5, 4, 8, 0, 0).unwrap());

        let mut r = Reservation {
            id: 1,
            book_id: 1,
            user_id: 9,
            reservation_date: created,
            status: ReservationStatus::Pending,
            expiry_date: expiry,
            fulfilled_date: None,
            queue_position: 1,
            created_at: created,
            updated_at: created,
        };
        assert!(!r.is_expired(expiry));
        assert!(r.is_expired(expiry + Duration::seconds(1)));
        assert!(r.status.ensure_pending().is_ok());

        r.status = ReservationStatus::Cancelled;
        assert!(!r.is_expired(expiry + Duration::days(1)));
        assert!(matches!(r.status.ensure_pending(), Err(AppError::InvalidState(_))));
    }
}
