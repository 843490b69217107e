//! Fines service

use chrono::Utc;
use rust_decimal::Decimal;

use super::member_scope;
use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::{
        fine::{Fine, FineDetails, SyncReport},
        ActorClaims,
    },
    repository::Repository,
};

const DEFAULT_PAYMENT_METHOD: &str = "cash";

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
    rules: CirculationConfig,
}

impl FinesService {
    pub fn new(repository: Repository, rules: CirculationConfig) -> Self {
        Self { repository, rules }
    }

    async fn sync(&self, user_id: Option<i32>) -> AppResult<SyncReport> {
        self.repository
            .fines
            .sync_overdue(user_id, Utc::now(), self.rules.fine_per_day)
            .await
    }

    /// Recompute overdue fines for one member or, for staff, everyone
    pub async fn sync_overdue(&self, actor: &ActorClaims, user_id: Option<i32>) -> AppResult<SyncReport> {
        let scope = member_scope(actor, user_id)?;
        self.sync(scope).await
    }

    /// Unscoped pass used by the background sweep
    pub(crate) async fn sync_all(&self) -> AppResult<SyncReport> {
        self.sync(None).await
    }

    pub async fn user_fines(&self, actor: &ActorClaims, user_id: i32) -> AppResult<Vec<FineDetails>> {
        actor.require_self_or_staff(user_id)?;
        self.sync(Some(user_id)).await?;
        self.repository.fines.list_for_user(user_id).await
    }

    pub async fn all_fines(&self, actor: &ActorClaims) -> AppResult<Vec<FineDetails>> {
        actor.require_staff()?;
        self.sync(None).await?;
        self.repository.fines.list_all(self.rules.listing_limit).await
    }

    pub async fn unpaid_fines(&self, actor: &ActorClaims, user_id: Option<i32>) -> AppResult<Vec<FineDetails>> {
        let scope = member_scope(actor, user_id)?;
        self.sync(scope).await?;
        self.repository.fines.list_unpaid(scope).await
    }

    pub async fn total_unpaid(&self, actor: &ActorClaims, user_id: Option<i32>) -> AppResult<Decimal> {
        let scope = member_scope(actor, user_id)?;
        self.sync(scope).await?;
        self.repository.fines.total_unpaid(scope).await
    }

    /// Settle a fine. Members may pay their own.
    pub async fn pay(&self, actor: &ActorClaims, fine_id: i32, method: Option<String>) -> AppResult<Fine> {
        let fine = self.repository.fines.get_by_id(fine_id).await?;
        actor.require_self_or_staff(fine.user_id)?;

        let method = method
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        self.repository.fines.pay(fine_id, &method, Utc::now()).await
    }
}
