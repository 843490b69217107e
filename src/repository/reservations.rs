//! Reservations repository: per-book FIFO wait-list

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, Pool, Postgres};

use super::books;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookShort, BOOK_SHORT_COLUMNS},
        profile::{ProfileShort, PROFILE_SHORT_COLUMNS},
        reservation::{next_queue_position, Reservation, ReservationDetails, ReservationStatus},
    },
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

fn details_select() -> String {
    format!(
        "SELECT r.*, {}, {} FROM reservations r \
         JOIN books b ON b.id = r.book_id \
         JOIN profiles p ON p.id = r.user_id",
        BOOK_SHORT_COLUMNS, PROFILE_SHORT_COLUMNS
    )
}

fn details_from_row(row: &PgRow) -> Result<ReservationDetails, sqlx::Error> {
    let reservation = Reservation::from_row(row)?;
    let book = BookShort::from_joined(row, reservation.book_id)?;
    let user = ProfileShort::from_joined(row, reservation.user_id)?;
    Ok(ReservationDetails { reservation, book, user })
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Join the wait-list of a fully checked-out book. The book row lock
    /// serializes position assignment per book.
    pub async fn create(
        &self,
        book_id: i32,
        user_id: i32,
        now: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let book = books::lock(&mut tx, book_id).await?;
        book.ensure_can_reserve()?;

        let already_pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE book_id = $1 AND user_id = $2 AND status = $3)",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(ReservationStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        if already_pending {
            return Err(AppError::DuplicatePending("reservation"));
        }

        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE book_id = $1 AND status = $2",
        )
        .bind(book_id)
        .bind(ReservationStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (book_id, user_id, reservation_date, status, expiry_date, queue_position, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $3, $3)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .bind(ReservationStatus::Pending)
        .bind(expiry_date)
        .bind(next_queue_position(pending))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, AppError::DuplicatePending("reservation")))?;

        tx.commit().await?;

        tracing::info!(
            reservation_id = reservation.id,
            book_id,
            user_id,
            queue_position = reservation.queue_position,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// Move a pending reservation to a terminal status
    pub async fn close(
        &self,
        id: i32,
        status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let fulfilled_date = (status == ReservationStatus::Fulfilled).then_some(now);

        let closed = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations SET status = $2, fulfilled_date = COALESCE($3, fulfilled_date), updated_at = $4
            WHERE id = $1 AND status = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(fulfilled_date)
        .bind(now)
        .bind(ReservationStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        match closed {
            Some(reservation) => {
                tracing::info!(reservation_id = id, status = %status, "Reservation closed");
                Ok(reservation)
            }
            None => {
                let current = self.get_by_id(id).await?;
                current.status.ensure_pending()?;
                Err(AppError::InvalidState(format!("Reservation {} changed concurrently", id)))
            }
        }
    }

    /// Expire every pending reservation past its expiry date
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $2, updated_at = $1 WHERE status = $3 AND expiry_date < $1",
        )
        .bind(now)
        .bind(ReservationStatus::Expired)
        .bind(ReservationStatus::Pending)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!(expired = result.rows_affected(), "Reservations expired");
        }
        Ok(result.rows_affected())
    }

    /// Reservations of a member, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<ReservationDetails>> {
        let sql = format!("{} WHERE r.user_id = $1 ORDER BY r.reservation_date DESC", details_select());
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Every reservation, newest first
    pub async fn list_all(&self, limit: i64) -> AppResult<Vec<ReservationDetails>> {
        let sql = format!("{} ORDER BY r.reservation_date DESC LIMIT $1", details_select());
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Pending reservations in queue order, optionally for one book
    pub async fn list_pending(&self, book_id: Option<i32>) -> AppResult<Vec<ReservationDetails>> {
        let sql = format!(
            "{} WHERE r.status = $1 AND ($2::int IS NULL OR r.book_id = $2) \
             ORDER BY r.book_id, r.queue_position, r.reservation_date, r.id",
            details_select()
        );
        let rows = sqlx::query(&sql)
            .bind(ReservationStatus::Pending)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }
}
