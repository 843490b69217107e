//! Circulation service: issue, self-borrow and return

use chrono::{DateTime, Utc};

use super::member_scope;
use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{
        transaction::{due_date_from, IssueBook, NewLoan, ReturnOutcome, Transaction, TransactionDetails},
        ActorClaims, ProfileShort,
    },
    repository::Repository,
};

const SELF_BORROW_NOTE: &str = "Self-borrowed online";

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    rules: CirculationConfig,
}

/// Due date of a loan issued at `now`: the requested one if it lies in the
/// future, otherwise the default loan period.
pub(crate) fn resolve_due_date(
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    loan_period_days: i64,
) -> AppResult<DateTime<Utc>> {
    match requested {
        Some(due) if due <= now => Err(AppError::Validation("Due date must be in the future".to_string())),
        Some(due) => Ok(due),
        None => Ok(due_date_from(now, loan_period_days)),
    }
}

impl CirculationService {
    pub fn new(repository: Repository, rules: CirculationConfig) -> Self {
        Self { repository, rules }
    }

    /// Issue a book to a member at the desk
    pub async fn issue_book(&self, actor: &ActorClaims, request: IssueBook) -> AppResult<Transaction> {
        actor.require_staff()?;

        let now = Utc::now();
        let due_date = resolve_due_date(request.due_date, now, self.rules.loan_period_days)?;

        // Verify borrower exists
        self.repository.profiles.get_short(request.user_id).await?;

        self.repository
            .transactions
            .issue(&NewLoan {
                book_id: request.book_id,
                user_id: request.user_id,
                issued_by: actor.user_id,
                issue_date: now,
                due_date,
                notes: request.notes,
            })
            .await
    }

    /// Issue desk lookup of a member by card number or email
    pub async fn find_member(&self, actor: &ActorClaims, search: &str) -> AppResult<ProfileShort> {
        actor.require_staff()?;

        let search = search.trim();
        if search.is_empty() {
            return Err(AppError::Validation("Member ID or email is required".to_string()));
        }

        self.repository
            .profiles
            .find_by_member_id_or_email(search)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No member matches '{}'", search)))
    }

    /// A member borrows a book for themselves
    pub async fn borrow_book(&self, actor: &ActorClaims, book_id: i32) -> AppResult<Transaction> {
        let now = Utc::now();
        self.repository
            .transactions
            .issue(&NewLoan {
                book_id,
                user_id: actor.user_id,
                issued_by: actor.user_id,
                issue_date: now,
                due_date: due_date_from(now, self.rules.loan_period_days),
                notes: Some(SELF_BORROW_NOTE.to_string()),
            })
            .await
    }

    /// Check a loan back in
    pub async fn return_book(&self, actor: &ActorClaims, transaction_id: i32) -> AppResult<ReturnOutcome> {
        actor.require_staff()?;
        self.repository
            .transactions
            .return_loan(transaction_id, actor.user_id, Utc::now(), self.rules.fine_per_day)
            .await
    }

    pub async fn get_transaction(&self, actor: &ActorClaims, id: i32) -> AppResult<Transaction> {
        let transaction = self.repository.transactions.get_by_id(id).await?;
        actor.require_self_or_staff(transaction.user_id)?;
        Ok(transaction)
    }

    /// Loan history of a member
    pub async fn user_transactions(&self, actor: &ActorClaims, user_id: i32) -> AppResult<Vec<TransactionDetails>> {
        actor.require_self_or_staff(user_id)?;
        self.repository.transactions.list_for_user(user_id).await
    }

    /// Unreturned loans, of one member or of everyone
    pub async fn active_transactions(
        &self,
        actor: &ActorClaims,
        user_id: Option<i32>,
    ) -> AppResult<Vec<TransactionDetails>> {
        let scope = member_scope(actor, user_id)?;
        self.repository.transactions.list_active(scope).await
    }

    pub async fn all_transactions(&self, actor: &ActorClaims) -> AppResult<Vec<TransactionDetails>> {
        actor.require_staff()?;
        self.repository.transactions.list_all(self.rules.listing_limit).await
    }

    pub async fn overdue_transactions(&self, actor: &ActorClaims) -> AppResult<Vec<TransactionDetails>> {
        actor.require_staff()?;
        self.repository.transactions.list_overdue(Utc::now()).await
    }

    /// Flag unreturned loans past due as overdue without touching fines
    pub async fn mark_overdue(&self, actor: &ActorClaims) -> AppResult<u64> {
        actor.require_staff()?;
        let updated = self.repository.transactions.mark_overdue(Utc::now()).await?;
        tracing::info!(updated, "Loans marked overdue");
        Ok(updated)
    }
}
