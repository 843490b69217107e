//! Books repository: catalog records and copy accounting

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::book::{cover_url, Availability, Book, BookQuery, CoverSize, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

/// Lock a book row for the rest of the enclosing database transaction.
/// Every copy-count mutation goes through this lock first.
pub(crate) async fn lock(conn: &mut PgConnection, id: i32) -> AppResult<Book> {
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
}

/// Take one copy off the shelf, refusing to go below zero
pub(crate) async fn take_copy(conn: &mut PgConnection, id: i32, now: DateTime<Utc>) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE books SET available_copies = available_copies - 1, updated_at = $2
        WHERE id = $1 AND available_copies > 0
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::BookUnavailable);
    }
    Ok(())
}

/// Put one copy back, refusing to exceed the total
pub(crate) async fn return_copy(conn: &mut PgConnection, id: i32, now: DateTime<Utc>) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE books SET available_copies = available_copies + 1, updated_at = $2
        WHERE id = $1 AND available_copies < total_copies
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::InvalidState(format!(
            "Book {} already has all of its copies on the shelf",
            id
        )));
    }
    Ok(())
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books with filters and pagination, ordered by title
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let (page, per_page) = query.page_bounds();
        let offset = (page - 1) * per_page;

        let total: i64 = Self::filtered(query, "SELECT COUNT(*) FROM books")
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = Self::filtered(query, "SELECT * FROM books");
        builder
            .push(" ORDER BY title ASC LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
        let books = builder.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    fn filtered<'q>(query: &'q BookQuery, select: &str) -> QueryBuilder<'q, Postgres> {
        let mut builder = QueryBuilder::new(select);
        builder.push(" WHERE TRUE");

        if let Some(ref genre) = query.genre {
            builder.push(" AND genre = ").push_bind(genre);
        }
        match query.availability.unwrap_or_default() {
            Availability::All => {}
            Availability::Available => {
                builder.push(" AND available_copies > 0");
            }
            Availability::Unavailable => {
                builder.push(" AND available_copies = 0");
            }
        }
        if let Some(year) = query.year {
            builder.push(" AND publication_year = ").push_bind(year);
        }
        if let Some(ref search) = query.search {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR author ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR isbn ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder
    }

    /// Quick search over title, author, ISBN and genre
    pub async fn search(&self, q: &str) -> AppResult<Vec<Book>> {
        let pattern = format!("%{}%", q);
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE title ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1 OR genre ILIKE $1
            ORDER BY title
            LIMIT 20
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Books with at least one copy on the shelf
    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE available_copies > 0 ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Distinct genres, sorted
    pub async fn genres(&self) -> AppResult<Vec<String>> {
        let genres = sqlx::query_scalar::<_, String>("SELECT DISTINCT genre FROM books ORDER BY genre")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    /// Create a book with every copy on the shelf
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                isbn, title, author, publisher, publication_year, genre,
                description, cover_url, total_copies, available_copies, location
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&data.isbn)
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.publisher)
        .bind(data.publication_year)
        .bind(&data.genre)
        .bind(&data.description)
        .bind(cover_url(&data.isbn, CoverSize::L))
        .bind(data.total_copies)
        .bind(&data.location)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(
                e,
                AppError::InvalidState(format!("A book with ISBN {} already exists", data.isbn)),
            )
        })?;
        Ok(book)
    }

    /// Partial update. A new total shifts the available count by the same
    /// delta under the row lock.
    pub async fn update(&self, id: i32, data: &UpdateBook, now: DateTime<Utc>) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;
        let current = lock(&mut tx, id).await?;

        let (total, available) = match data.total_copies {
            Some(total) => (total, current.resized_available(total)?),
            None => (current.total_copies, current.available_copies),
        };
        let cover = match data.isbn {
            Some(ref isbn) => Some(cover_url(isbn, CoverSize::L)),
            None => current.cover_url.clone(),
        };

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                isbn = COALESCE($2, isbn),
                title = COALESCE($3, title),
                author = COALESCE($4, author),
                publisher = COALESCE($5, publisher),
                publication_year = COALESCE($6, publication_year),
                genre = COALESCE($7, genre),
                description = COALESCE($8, description),
                location = COALESCE($9, location),
                cover_url = $10,
                total_copies = $11,
                available_copies = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.isbn)
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.publisher)
        .bind(data.publication_year)
        .bind(&data.genre)
        .bind(&data.description)
        .bind(&data.location)
        .bind(cover)
        .bind(total)
        .bind(available)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(
                e,
                AppError::InvalidState("Another book already uses this ISBN".to_string()),
            )
        })?;

        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book that has never circulated
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let book = lock(&mut tx, id).await?;

        if book.on_loan() > 0 {
            return Err(AppError::InvalidState(format!(
                "{} copies of this book are on loan",
                book.on_loan()
            )));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
                    AppError::InvalidState("Book has circulation history and cannot be deleted".to_string())
                }
                _ => AppError::Storage(e),
            })?;

        tx.commit().await?;
        Ok(())
    }
}
