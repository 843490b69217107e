#![allow(dead_code)]

use sqlx::PgPool;
use std::env;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};

use circulation_server::models::{Book, Role};

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Connect to `TEST_DATABASE_URL`, apply migrations and empty every table.
/// Tests sharing the database are serialized by the returned guard.
pub async fn init_test_db() -> TestDb {
    dotenvy::dotenv().ok();
    let url = env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let pool = PgPool::connect(&url).await.expect("connect test db");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    sqlx::query(
        "TRUNCATE fines, transactions, reservations, borrow_requests, books, profiles RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("truncate tables");

    TestDb { pool, _guard: guard }
}

pub async fn insert_profile(pool: &PgPool, name: &str, role: Role) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO profiles (email, full_name, role, member_id) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(format!("{}@library.test", name.to_lowercase()))
    .bind(name)
    .bind(role)
    .bind(format!("M-{}", name.to_uppercase()))
    .fetch_one(pool)
    .await
    .expect("insert profile")
}

pub async fn insert_book(pool: &PgPool, isbn: &str, copies: i32) -> i32 {
    sqlx::query_scalar(
        r#"
        INSERT INTO books (isbn, title, author, genre, total_copies, available_copies)
        VALUES ($1, $2, 'Test Author', 'Fiction', $3, $3)
        RETURNING id
        "#,
    )
    .bind(isbn)
    .bind(format!("Book {}", isbn))
    .bind(copies)
    .fetch_one(pool)
    .await
    .expect("insert book")
}

pub async fn book(pool: &PgPool, id: i32) -> Book {
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("fetch book")
}

pub async fn count(pool: &PgPool, sql: &str, id: i32) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.expect("count")
}
