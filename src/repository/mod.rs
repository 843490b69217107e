//! Repository layer for database operations

pub mod books;
pub mod borrow_requests;
pub mod fines;
pub mod profiles;
pub mod reservations;
pub mod transactions;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub profiles: profiles::ProfilesRepository,
    pub transactions: transactions::TransactionsRepository,
    pub fines: fines::FinesRepository,
    pub reservations: reservations::ReservationsRepository,
    pub borrow_requests: borrow_requests::BorrowRequestsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            profiles: profiles::ProfilesRepository::new(pool.clone()),
            transactions: transactions::TransactionsRepository::new(pool.clone()),
            fines: fines::FinesRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            borrow_requests: borrow_requests::BorrowRequestsRepository::new(pool.clone()),
            pool,
        }
    }
}
