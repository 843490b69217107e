//! Fines repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, FromRow, PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookShort, BOOK_SHORT_COLUMNS},
        fine::{outstanding, overdue_reason, Fine, FineDetails, SyncReport},
        profile::{ProfileShort, PROFILE_SHORT_COLUMNS},
        transaction::{Transaction, TransactionStatus},
    },
};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

fn details_select() -> String {
    format!(
        "SELECT f.*, t.book_id AS loan_book_id, t.due_date AS loan_due_date, \
         t.return_date AS loan_return_date, {}, {} FROM fines f \
         JOIN transactions t ON t.id = f.transaction_id \
         JOIN books b ON b.id = t.book_id \
         JOIN profiles p ON p.id = f.user_id",
        BOOK_SHORT_COLUMNS, PROFILE_SHORT_COLUMNS
    )
}

fn details_from_row(row: &PgRow) -> Result<FineDetails, sqlx::Error> {
    let fine = Fine::from_row(row)?;
    let book = BookShort::from_joined(row, row.try_get("loan_book_id")?)?;
    let user = ProfileShort::from_joined(row, fine.user_id)?;
    Ok(FineDetails {
        due_date: row.try_get("loan_due_date")?,
        return_date: row.try_get("loan_return_date")?,
        fine,
        book,
        user,
    })
}

/// Bring the unpaid fine of a loan up to `total_due` minus whatever has
/// already been paid for it. Inserts the fine if the loan has none unpaid,
/// otherwise updates it in place. Returns `None` when nothing is owed.
pub(crate) async fn upsert_unpaid(
    conn: &mut PgConnection,
    loan: &Transaction,
    reason: &str,
    total_due: Decimal,
    now: DateTime<Utc>,
) -> AppResult<Option<Fine>> {
    let paid: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM fines WHERE transaction_id = $1 AND paid",
    )
    .bind(loan.id)
    .fetch_one(&mut *conn)
    .await?;

    let owed = outstanding(total_due, paid);
    if owed.is_zero() {
        return Ok(None);
    }

    let fine = sqlx::query_as::<_, Fine>(
        r#"
        INSERT INTO fines (transaction_id, user_id, amount, reason, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        ON CONFLICT (transaction_id) WHERE NOT paid
        DO UPDATE SET
            amount = GREATEST(fines.amount, EXCLUDED.amount),
            reason = EXCLUDED.reason,
            updated_at = EXCLUDED.updated_at
        RETURNING *
        "#,
    )
    .bind(loan.id)
    .bind(loan.user_id)
    .bind(owed)
    .bind(reason)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(fine_id = fine.id, transaction_id = loan.id, amount = %fine.amount, "Fine upserted");
    Ok(Some(fine))
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get fine by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::FineNotFound(id))
    }

    /// Recompute fines of every unreturned loan past due, optionally for one
    /// borrower. Locks the loans for the pass so a concurrent return waits.
    pub async fn sync_overdue(
        &self,
        user_id: Option<i32>,
        now: DateTime<Utc>,
        fine_per_day: Decimal,
    ) -> AppResult<SyncReport> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            SELECT t.*, b.title AS book_title
            FROM transactions t
            JOIN books b ON b.id = t.book_id
            WHERE t.return_date IS NULL
              AND t.due_date < $1
              AND ($2::int IS NULL OR t.user_id = $2)
            ORDER BY t.id
            FOR UPDATE OF t
            "#,
        )
        .bind(now)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut report = SyncReport::default();
        for row in rows {
            let loan = Transaction::from_row(&row)?;
            let title: String = row.try_get("book_title")?;
            let Some(fine_amount) = loan.accrued_fine(now, fine_per_day) else {
                continue;
            };
            report.overdue_loans += 1;

            let reason = overdue_reason(&title, loan.days_overdue(now));
            let fine = upsert_unpaid(&mut tx, &loan, &reason, fine_amount, now).await?;
            if fine.is_some() {
                report.fines_upserted += 1;
            }

            sqlx::query(
                r#"
                UPDATE transactions SET
                    status = $2,
                    fine_amount = GREATEST(fine_amount, $3),
                    fine_paid = CASE WHEN $4 THEN FALSE ELSE fine_paid END,
                    updated_at = $5
                WHERE id = $1
                "#,
            )
            .bind(loan.id)
            .bind(TransactionStatus::Overdue)
            .bind(fine_amount)
            .bind(fine.is_some())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        if report.overdue_loans > 0 {
            tracing::info!(
                overdue_loans = report.overdue_loans,
                fines_upserted = report.fines_upserted,
                "Overdue fines synchronized"
            );
        }
        Ok(report)
    }

    /// Mark a fine paid and flag its loan as settled
    pub async fn pay(&self, id: i32, method: &str, now: DateTime<Utc>) -> AppResult<Fine> {
        let mut tx = self.pool.begin().await?;

        // Loan before fine, the same order as sync and return
        sqlx::query(
            "SELECT id FROM transactions WHERE id = (SELECT transaction_id FROM fines WHERE id = $1) FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::FineNotFound(id))?;

        let fine = sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::FineNotFound(id))?;

        if fine.paid {
            return Err(AppError::InvalidState(format!("Fine {} is already paid", id)));
        }

        let fine = sqlx::query_as::<_, Fine>(
            r#"
            UPDATE fines SET paid = TRUE, paid_date = $2, payment_method = $3, updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(method)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE transactions SET fine_paid = TRUE, updated_at = $2 WHERE id = $1")
            .bind(fine.transaction_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(fine_id = id, amount = %fine.amount, method, "Fine paid");
        Ok(fine)
    }

    /// Fines of a member, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<FineDetails>> {
        let sql = format!("{} WHERE f.user_id = $1 ORDER BY f.created_at DESC", details_select());
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Every fine, newest first
    pub async fn list_all(&self, limit: i64) -> AppResult<Vec<FineDetails>> {
        let sql = format!("{} ORDER BY f.created_at DESC LIMIT $1", details_select());
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Unpaid fines, optionally for one member, oldest first
    pub async fn list_unpaid(&self, user_id: Option<i32>) -> AppResult<Vec<FineDetails>> {
        let sql = format!(
            "{} WHERE NOT f.paid AND ($1::int IS NULL OR f.user_id = $1) ORDER BY f.created_at ASC",
            details_select()
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    /// Sum of unpaid fines, optionally for one member
    pub async fn total_unpaid(&self, user_id: Option<i32>) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM fines WHERE NOT paid AND ($1::int IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
