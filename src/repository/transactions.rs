//! Transactions repository: the issue/return state machine against the store

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, FromRow, PgConnection, Pool, Postgres};

use super::{books, fines};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookShort, BOOK_SHORT_COLUMNS},
        fine::overdue_reason,
        profile::{ProfileShort, PROFILE_SHORT_COLUMNS},
        transaction::{NewLoan, ReturnOutcome, Transaction, TransactionDetails, TransactionStatus},
    },
};

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

fn details_select() -> String {
    format!(
        "SELECT t.*, {}, {} FROM transactions t \
         JOIN books b ON b.id = t.book_id \
         JOIN profiles p ON p.id = t.user_id",
        BOOK_SHORT_COLUMNS, PROFILE_SHORT_COLUMNS
    )
}

fn details_from_row(row: &PgRow) -> Result<TransactionDetails, sqlx::Error> {
    let transaction = Transaction::from_row(row)?;
    let book = BookShort::from_joined(row, transaction.book_id)?;
    let user = ProfileShort::from_joined(row, transaction.user_id)?;
    Ok(TransactionDetails { transaction, book, user })
}

/// Whether the borrower currently holds a copy of the book
pub(crate) async fn has_active_loan(conn: &mut PgConnection, book_id: i32, user_id: i32) -> AppResult<bool> {
    let held: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM transactions WHERE book_id = $1 AND user_id = $2 AND return_date IS NULL)",
    )
    .bind(book_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(held)
}

/// Insert an issued loan. Callers hold the book lock and have taken the copy.
pub(crate) async fn insert_loan(conn: &mut PgConnection, loan: &NewLoan) -> AppResult<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (book_id, user_id, issued_by, issue_date, due_date, status, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $4, $4)
        RETURNING *
        "#,
    )
    .bind(loan.book_id)
    .bind(loan.user_id)
    .bind(loan.issued_by)
    .bind(loan.issue_date)
    .bind(loan.due_date)
    .bind(TransactionStatus::Issued)
    .bind(&loan.notes)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::on_unique_violation(e, AppError::DuplicateLoan))
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get transaction by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Transaction> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction with id {} not found", id)))
    }

    /// Issue a book. The availability check, duplicate check, decrement and
    /// insert run as one database transaction under the book row lock.
    pub async fn issue(&self, loan: &NewLoan) -> AppResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let book = books::lock(&mut tx, loan.book_id).await?;
        book.ensure_can_issue()?;

        if has_active_loan(&mut tx, loan.book_id, loan.user_id).await? {
            return Err(AppError::DuplicateLoan);
        }

        books::take_copy(&mut tx, loan.book_id, loan.issue_date).await?;
        let transaction = insert_loan(&mut tx, loan).await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = transaction.id,
            book_id = loan.book_id,
            user_id = loan.user_id,
            due_date = %transaction.due_date,
            "Book issued"
        );
        Ok(transaction)
    }

    /// Return a loan: settle status and fine, put the copy back and record
    /// any fine still owed, all in one database transaction.
    pub async fn return_loan(
        &self,
        id: i32,
        returned_by: i32,
        now: DateTime<Utc>,
        fine_per_day: Decimal,
    ) -> AppResult<ReturnOutcome> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction with id {} not found", id)))?;

        let settlement = loan.settle(now, fine_per_day)?;

        books::return_copy(&mut tx, loan.book_id, now).await?;

        let fine = if settlement.fine_amount > Decimal::ZERO {
            let title: String = sqlx::query_scalar("SELECT title FROM books WHERE id = $1")
                .bind(loan.book_id)
                .fetch_one(&mut *tx)
                .await?;
            let reason = overdue_reason(&title, settlement.days_overdue);
            fines::upsert_unpaid(&mut tx, &loan, &reason, settlement.fine_amount, now).await?
        } else {
            None
        };

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions SET
                return_date = $2,
                returned_by = $3,
                status = $4,
                fine_amount = $5,
                fine_paid = CASE WHEN $6 THEN FALSE ELSE fine_paid END,
                updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(returned_by)
        .bind(settlement.status)
        .bind(settlement.fine_amount)
        .bind(fine.is_some())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = id,
            book_id = transaction.book_id,
            status = %transaction.status,
            fine = %transaction.fine_amount,
            "Book returned"
        );
        Ok(ReturnOutcome { transaction, fine })
    }

    /// Loan history of a member, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<TransactionDetails>> {
        let sql = format!("{} WHERE t.user_id = $1 ORDER BY t.issue_date DESC", details_select());
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Unreturned loans, optionally for one member, newest first
    pub async fn list_active(&self, user_id: Option<i32>) -> AppResult<Vec<TransactionDetails>> {
        let sql = format!(
            "{} WHERE t.return_date IS NULL AND ($1::int IS NULL OR t.user_id = $1) ORDER BY t.issue_date DESC",
            details_select()
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Every loan, newest first
    pub async fn list_all(&self, limit: i64) -> AppResult<Vec<TransactionDetails>> {
        let sql = format!("{} ORDER BY t.issue_date DESC LIMIT $1", details_select());
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Unreturned loans past their due date, oldest due date first
    pub async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<TransactionDetails>> {
        let sql = format!(
            "{} WHERE t.return_date IS NULL AND t.due_date < $1 ORDER BY t.due_date ASC",
            details_select()
        );
        let rows = sqlx::query(&sql).bind(now).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Flag issued loans past their due date as overdue
    pub async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET status = $2, updated_at = $1
            WHERE status = $3 AND return_date IS NULL AND due_date < $1
            "#,
        )
        .bind(now)
        .bind(TransactionStatus::Overdue)
        .bind(TransactionStatus::Issued)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
