//! Borrow requests repository

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, Pool, Postgres};

use super::{books, transactions};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookShort, BOOK_SHORT_COLUMNS},
        borrow_request::{BorrowRequest, BorrowRequestDetails, BorrowRequestStatus},
        profile::{ProfileShort, PROFILE_SHORT_COLUMNS},
        transaction::{NewLoan, Transaction},
    },
};

const APPROVAL_NOTE: &str = "Approved from borrow request";

#[derive(Clone)]
pub struct BorrowRequestsRepository {
    pool: Pool<Postgres>,
}

fn details_select() -> String {
    format!(
        "SELECT r.*, {}, {} FROM borrow_requests r \
         JOIN books b ON b.id = r.book_id \
         JOIN profiles p ON p.id = r.user_id",
        BOOK_SHORT_COLUMNS, PROFILE_SHORT_COLUMNS
    )
}

fn details_from_row(row: &PgRow) -> Result<BorrowRequestDetails, sqlx::Error> {
    let request = BorrowRequest::from_row(row)?;
    let book = BookShort::from_joined(row, request.book_id)?;
    let user = ProfileShort::from_joined(row, request.user_id)?;
    Ok(BorrowRequestDetails { request, book, user })
}

impl BorrowRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow request by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BorrowRequest> {
        sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request with id {} not found", id)))
    }

    /// File a pending request. Availability is not checked here, only when
    /// the request is approved.
    pub async fn create(
        &self,
        book_id: i32,
        user_id: i32,
        notes: Option<&str>,
        now: DateTime<Utc>,
        requested_due_date: DateTime<Utc>,
    ) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let already_pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrow_requests WHERE book_id = $1 AND user_id = $2 AND status = $3)",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(BorrowRequestStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;
        if already_pending {
            return Err(AppError::DuplicatePending("borrow request"));
        }

        if transactions::has_active_loan(&mut tx, book_id, user_id).await? {
            return Err(AppError::AlreadyBorrowed);
        }

        let request = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO borrow_requests (book_id, user_id, request_date, requested_due_date, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $3, $3)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .bind(requested_due_date)
        .bind(BorrowRequestStatus::Pending)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, AppError::DuplicatePending("borrow request")))?;

        tx.commit().await?;

        tracing::info!(request_id = request.id, book_id, user_id, "Borrow request created");
        Ok(request)
    }

    /// Approve a pending request: issue the loan and close the request in
    /// one database transaction. On any failure the request stays pending.
    pub async fn approve(
        &self,
        id: i32,
        reviewer_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<(BorrowRequest, Transaction)> {
        let mut tx = self.pool.begin().await?;

        let request = self.lock(&mut tx, id).await?;
        let next = request.status.transition(BorrowRequestStatus::Approved)?;

        let book = books::lock(&mut tx, request.book_id).await?;
        book.ensure_can_issue()?;

        if transactions::has_active_loan(&mut tx, request.book_id, request.user_id).await? {
            return Err(AppError::AlreadyBorrowed);
        }

        books::take_copy(&mut tx, request.book_id, now).await?;
        let loan = transactions::insert_loan(
            &mut tx,
            &NewLoan {
                book_id: request.book_id,
                user_id: request.user_id,
                issued_by: reviewer_id,
                issue_date: now,
                due_date: request.requested_due_date,
                notes: Some(APPROVAL_NOTE.to_string()),
            },
        )
        .await?;

        let request = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests SET status = $2, reviewed_by = $3, reviewed_at = $4, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(reviewer_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = id,
            transaction_id = loan.id,
            reviewer_id,
            "Borrow request approved"
        );
        Ok((request, loan))
    }

    /// Reject a pending request with a reason
    pub async fn reject(
        &self,
        id: i32,
        reviewer_id: i32,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;
        let current = self.lock(&mut tx, id).await?;
        let next = current.status.transition(BorrowRequestStatus::Rejected)?;

        let request = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests SET status = $2, reviewed_by = $3, reviewed_at = $4, rejection_reason = $5, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(reviewer_id)
        .bind(now)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(request_id = id, reviewer_id, "Borrow request rejected");
        Ok(request)
    }

    /// Withdraw a pending request
    pub async fn cancel(&self, id: i32, now: DateTime<Utc>) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;
        let current = self.lock(&mut tx, id).await?;
        let next = current.status.transition(BorrowRequestStatus::Cancelled)?;

        let request = sqlx::query_as::<_, BorrowRequest>(
            "UPDATE borrow_requests SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(next)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(request_id = id, "Borrow request cancelled");
        Ok(request)
    }

    async fn lock(&self, conn: &mut sqlx::PgConnection, id: i32) -> AppResult<BorrowRequest> {
        sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request with id {} not found", id)))
    }

    /// Requests of a member, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<BorrowRequestDetails>> {
        let sql = format!("{} WHERE r.user_id = $1 ORDER BY r.request_date DESC", details_select());
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Pending requests, oldest first so the review queue is fair
    pub async fn list_pending(&self) -> AppResult<Vec<BorrowRequestDetails>> {
        let sql = format!("{} WHERE r.status = $1 ORDER BY r.request_date ASC", details_select());
        let rows = sqlx::query(&sql)
            .bind(BorrowRequestStatus::Pending)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Every request, newest first
    pub async fn list_all(&self, limit: i64) -> AppResult<Vec<BorrowRequestDetails>> {
        let sql = format!("{} ORDER BY r.request_date DESC LIMIT $1", details_select());
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }
}
