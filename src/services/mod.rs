//! Business logic services
//!
//! Every operation takes the acting profile and checks its capability
//! here, so the staff desk, the member portal and the admin console share
//! one core API.

pub mod borrow_requests;
pub mod catalog;
pub mod circulation;
pub mod fines;
pub mod reservations;
pub mod stats;

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::ActorClaims,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub fines: fines::FinesService,
    pub reservations: reservations::ReservationsService,
    pub borrow_requests: borrow_requests::BorrowRequestsService,
    pub stats: stats::StatsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, rules: CirculationConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository.clone(), rules.clone()),
            fines: fines::FinesService::new(repository.clone(), rules.clone()),
            reservations: reservations::ReservationsService::new(repository.clone(), rules.clone()),
            borrow_requests: borrow_requests::BorrowRequestsService::new(repository.clone(), rules),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }

    /// One pass of the periodic maintenance: recompute overdue fines and
    /// expire stale reservations.
    pub async fn sweep(&self) -> AppResult<()> {
        let report = self.fines.sync_all().await?;
        let expired = self.reservations.expire_stale().await?;
        tracing::debug!(
            overdue_loans = report.overdue_loans,
            fines_upserted = report.fines_upserted,
            expired_reservations = expired,
            "Sweep finished"
        );
        Ok(())
    }
}

/// Resolve the member scope of a listing: `None` means everyone and is
/// reserved to staff, `Some(id)` is open to that member and to staff.
pub(crate) fn member_scope(actor: &ActorClaims, user_id: Option<i32>) -> AppResult<Option<i32>> {
    match user_id {
        Some(id) => actor.require_self_or_staff(id)?,
        None => actor.require_staff()?,
    }
    Ok(user_id)
}
