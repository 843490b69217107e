//! Statistics service

use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        stats::{DashboardStats, MemberStats},
        ActorClaims, BorrowRequestStatus, ReservationStatus, TransactionStatus,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Circulation dashboard counters
    pub async fn dashboard(&self, actor: &ActorClaims) -> AppResult<DashboardStats> {
        actor.require_staff()?;

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total_copies), 0)::BIGINT FROM books) AS total_books,
                (SELECT COALESCE(SUM(available_copies), 0)::BIGINT FROM books) AS available_books,
                (SELECT COUNT(*) FROM profiles WHERE role = 'member') AS total_members,
                (SELECT COUNT(*) FROM transactions WHERE status = $1) AS active_transactions,
                (SELECT COUNT(*) FROM transactions WHERE status = $2) AS overdue_transactions,
                (SELECT COALESCE(SUM(amount), 0) FROM fines) AS total_fines,
                (SELECT COALESCE(SUM(amount), 0) FROM fines WHERE NOT paid) AS unpaid_fines,
                (SELECT COUNT(*) FROM reservations WHERE status = $3) AS total_reservations,
                (SELECT COUNT(*) FROM borrow_requests WHERE status = $4) AS pending_requests
            "#,
        )
        .bind(TransactionStatus::Issued)
        .bind(TransactionStatus::Overdue)
        .bind(ReservationStatus::Pending)
        .bind(BorrowRequestStatus::Pending)
        .fetch_one(&self.repository.pool)
        .await?;

        Ok(stats)
    }

    /// Loan and fine summary of one member, for the member or staff
    pub async fn member(&self, actor: &ActorClaims, user_id: i32) -> AppResult<MemberStats> {
        actor.require_self_or_staff(user_id)?;

        // Verify member exists
        self.repository.profiles.get_short(user_id).await?;

        let stats = sqlx::query_as::<_, MemberStats>(
            r#"
            SELECT
                $1::INT AS user_id,
                (SELECT COUNT(*) FROM transactions WHERE user_id = $1) AS total_borrowed,
                (SELECT COUNT(*) FROM transactions WHERE user_id = $1 AND return_date IS NULL)
                    AS currently_borrowed,
                (SELECT COUNT(*) FROM transactions
                    WHERE user_id = $1 AND return_date IS NULL AND due_date < $2) AS overdue,
                (SELECT COALESCE(SUM(amount), 0) FROM fines WHERE user_id = $1) AS total_fines,
                (SELECT COALESCE(SUM(amount), 0) FROM fines WHERE user_id = $1 AND NOT paid)
                    AS unpaid_fines
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.repository.pool)
        .await?;

        Ok(stats)
    }
}
