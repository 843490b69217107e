//! Borrow-request workflow service

use chrono::Utc;
use validator::Validate;

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{
        borrow_request::{
            BorrowRequest, BorrowRequestDetails, CreateBorrowRequest, RejectBorrowRequest,
            DEFAULT_REJECTION_REASON,
        },
        transaction::{due_date_from, Transaction},
        ActorClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowRequestsService {
    repository: Repository,
    rules: CirculationConfig,
}

impl BorrowRequestsService {
    pub fn new(repository: Repository, rules: CirculationConfig) -> Self {
        Self { repository, rules }
    }

    /// File a request to borrow a book, on the caller's own behalf
    pub async fn create(&self, actor: &ActorClaims, request: CreateBorrowRequest) -> AppResult<BorrowRequest> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let now = Utc::now();
        self.repository
            .borrow_requests
            .create(
                request.book_id,
                actor.user_id,
                request.notes.as_deref(),
                now,
                due_date_from(now, self.rules.loan_period_days),
            )
            .await
    }

    /// Approve and issue in one step
    pub async fn approve(&self, actor: &ActorClaims, id: i32) -> AppResult<(BorrowRequest, Transaction)> {
        actor.require_staff()?;
        self.repository
            .borrow_requests
            .approve(id, actor.user_id, Utc::now())
            .await
    }

    pub async fn reject(
        &self,
        actor: &ActorClaims,
        id: i32,
        request: RejectBorrowRequest,
    ) -> AppResult<BorrowRequest> {
        actor.require_staff()?;
        let reason = request
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());
        self.repository
            .borrow_requests
            .reject(id, actor.user_id, &reason, Utc::now())
            .await
    }

    /// Only the member who filed the request may withdraw it
    pub async fn cancel(&self, actor: &ActorClaims, id: i32) -> AppResult<BorrowRequest> {
        let request = self.repository.borrow_requests.get_by_id(id).await?;
        actor.require_self(request.user_id)?;
        self.repository.borrow_requests.cancel(id, Utc::now()).await
    }

    pub async fn user_requests(&self, actor: &ActorClaims, user_id: i32) -> AppResult<Vec<BorrowRequestDetails>> {
        actor.require_self_or_staff(user_id)?;
        self.repository.borrow_requests.list_for_user(user_id).await
    }

    pub async fn pending_requests(&self, actor: &ActorClaims) -> AppResult<Vec<BorrowRequestDetails>> {
        actor.require_staff()?;
        self.repository.borrow_requests.list_pending().await
    }

    pub async fn all_requests(&self, actor: &ActorClaims) -> AppResult<Vec<BorrowRequestDetails>> {
        actor.require_staff()?;
        self.repository.borrow_requests.list_all(self.rules.listing_limit).await
    }
}
