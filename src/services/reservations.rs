//! Reservation queue service

use chrono::Utc;

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::{
        reservation::{expiry_from, CreateReservation, Reservation, ReservationDetails, ReservationStatus},
        ActorClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    rules: CirculationConfig,
}

impl ReservationsService {
    pub fn new(repository: Repository, rules: CirculationConfig) -> Self {
        Self { repository, rules }
    }

    /// Join the wait-list of a checked-out book. Staff may enqueue another member.
    pub async fn create(&self, actor: &ActorClaims, request: CreateReservation) -> AppResult<Reservation> {
        let user_id = request.user_id.unwrap_or(actor.user_id);
        if user_id != actor.user_id {
            actor.require_staff()?;
            self.repository.profiles.get_short(user_id).await?;
        }

        let now = Utc::now();
        self.repository
            .reservations
            .create(
                request.book_id,
                user_id,
                now,
                expiry_from(now, self.rules.reservation_expiry_days),
            )
            .await
    }

    /// Librarian signal that the held copy was handed over. The loan itself
    /// is issued separately.
    pub async fn fulfill(&self, actor: &ActorClaims, id: i32) -> AppResult<Reservation> {
        actor.require_staff()?;
        self.repository
            .reservations
            .close(id, ReservationStatus::Fulfilled, Utc::now())
            .await
    }

    pub async fn cancel(&self, actor: &ActorClaims, id: i32) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        actor.require_self_or_staff(reservation.user_id)?;
        self.repository
            .reservations
            .close(id, ReservationStatus::Cancelled, Utc::now())
            .await
    }

    /// Expire pending reservations past their hold period
    pub async fn expire(&self, actor: &ActorClaims) -> AppResult<u64> {
        actor.require_staff()?;
        self.expire_stale().await
    }

    pub(crate) async fn expire_stale(&self) -> AppResult<u64> {
        self.repository.reservations.expire_overdue(Utc::now()).await
    }

    pub async fn user_reservations(&self, actor: &ActorClaims, user_id: i32) -> AppResult<Vec<ReservationDetails>> {
        actor.require_self_or_staff(user_id)?;
        self.expire_stale().await?;
        self.repository.reservations.list_for_user(user_id).await
    }

    pub async fn all_reservations(&self, actor: &ActorClaims) -> AppResult<Vec<ReservationDetails>> {
        actor.require_staff()?;
        self.expire_stale().await?;
        self.repository.reservations.list_all(self.rules.listing_limit).await
    }

    /// Pending queue, optionally for one book
    pub async fn pending_reservations(
        &self,
        actor: &ActorClaims,
        book_id: Option<i32>,
    ) -> AppResult<Vec<ReservationDetails>> {
        actor.require_staff()?;
        self.expire_stale().await?;
        self.repository.reservations.list_pending(book_id).await
    }
}
