//! Catalog management service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookPage, BookQuery, CreateBook, UpdateBook},
        ActorClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// List books with filters and pagination
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<BookPage> {
        let (items, total) = self.repository.books.list(query).await?;
        let (page, per_page) = query.page_bounds();

        Ok(BookPage {
            items,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        })
    }

    pub async fn search(&self, q: &str) -> AppResult<Vec<Book>> {
        if q.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.repository.books.search(q.trim()).await
    }

    pub async fn available_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list_available().await
    }

    pub async fn genres(&self) -> AppResult<Vec<String>> {
        self.repository.books.genres().await
    }

    pub async fn create_book(&self, actor: &ActorClaims, mut book: CreateBook) -> AppResult<Book> {
        actor.require_staff()?;
        book.validate().map_err(|e| AppError::Validation(e.to_string()))?;
        book.isbn = normalize_isbn(&book.isbn);

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, isbn = %created.isbn, "Book created");
        Ok(created)
    }

    pub async fn update_book(&self, actor: &ActorClaims, id: i32, mut update: UpdateBook) -> AppResult<Book> {
        actor.require_staff()?;
        update.validate().map_err(|e| AppError::Validation(e.to_string()))?;
        update.isbn = update.isbn.as_deref().map(normalize_isbn);

        let updated = self.repository.books.update(id, &update, Utc::now()).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(updated)
    }

    pub async fn delete_book(&self, actor: &ActorClaims, id: i32) -> AppResult<()> {
        actor.require_admin()?;
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}

/// Strip hyphens and spaces, upper-case the ISBN-10 check digit
fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
