//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

static ISBN10: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{9}[\dXx]$").expect("valid regex"));
static ISBN13: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{13}$").expect("valid regex"));

const COVER_HOST: &str = "https://covers.openlibrary.org/b/isbn";
/// Highest catalog page served
pub const MAX_PAGE: i64 = 100_000;

const PLACEHOLDER_COVER: &str = "/placeholder-book.png";

/// Book record; the single source of truth for copy counts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan
    pub fn on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    /// Issuing requires at least one copy on the shelf
    pub fn ensure_can_issue(&self) -> AppResult<()> {
        if self.available_copies > 0 {
            Ok(())
        } else {
            Err(AppError::BookUnavailable)
        }
    }

    /// Reservations are only taken for fully checked-out titles
    pub fn ensure_can_reserve(&self) -> AppResult<()> {
        if self.available_copies > 0 {
            Err(AppError::BookAvailable)
        } else {
            Ok(())
        }
    }

    /// Available count after changing the total to `new_total`, keeping
    /// every copy on loan accounted for.
    pub fn resized_available(&self, new_total: i32) -> AppResult<i32> {
        if new_total < 0 {
            return Err(AppError::Validation("total_copies cannot be negative".to_string()));
        }
        let available = self.available_copies + (new_total - self.total_copies);
        if available < 0 {
            return Err(AppError::InvalidState(format!(
                "{} copies are on loan, total_copies cannot drop to {}",
                self.on_loan(),
                new_total
            )));
        }
        Ok(available)
    }
}

/// Book summary joined onto circulation records
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub cover_url: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Columns selected from `books b` for [`BookShort::from_joined`]
pub(crate) const BOOK_SHORT_COLUMNS: &str = "b.isbn AS book_isbn, b.title AS book_title, \
     b.author AS book_author, b.genre AS book_genre, b.cover_url AS book_cover_url, \
     b.total_copies AS book_total_copies, b.available_copies AS book_available_copies";

impl BookShort {
    pub(crate) fn from_joined(row: &PgRow, id: i32) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id,
            isbn: row.try_get("book_isbn")?,
            title: row.try_get("book_title")?,
            author: row.try_get("book_author")?,
            genre: row.try_get("book_genre")?,
            cover_url: row.try_get("book_cover_url")?,
            total_copies: row.try_get("book_total_copies")?,
            available_copies: row.try_get("book_available_copies")?,
        })
    }
}

/// Cover image size on the public image host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CoverSize {
    S,
    M,
    L,
}

/// Cover image URL for an ISBN
pub fn cover_url(isbn: &str, size: CoverSize) -> String {
    if isbn.trim().is_empty() {
        return PLACEHOLDER_COVER.to_string();
    }
    format!("{}/{}-{:?}.jpg", COVER_HOST, isbn.trim(), size)
}

/// Accepts ISBN-10 or ISBN-13, ignoring hyphens and spaces
pub fn is_valid_isbn(isbn: &str) -> bool {
    let clean: String = isbn.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect();
    match clean.len() {
        10 => ISBN10.is_match(&clean),
        13 => ISBN13.is_match(&clean),
        _ => false,
    }
}

fn validate_isbn(isbn: &str) -> Result<(), validator::ValidationError> {
    if is_valid_isbn(isbn) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("isbn"))
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(custom(function = "validate_isbn", message = "Invalid ISBN"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "total_copies cannot be negative"))]
    pub total_copies: i32,
    pub location: Option<String>,
}

/// Partial book update
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(custom(function = "validate_isbn", message = "Invalid ISBN"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "total_copies cannot be negative"))]
    pub total_copies: Option<i32>,
    pub location: Option<String>,
}

/// Availability filter for the catalog listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    All,
    Available,
    Unavailable,
}

/// Catalog query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub genre: Option<String>,
    pub availability: Option<Availability>,
    pub year: Option<i32>,
    /// Substring match over title, author and ISBN
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
    /// 1-based page clamped to 1..=MAX_PAGE and page size clamped to
    /// 1..=100 (default 12)
    pub fn page_bounds(&self) -> (i64, i64) {
        (
            self.page.unwrap_or(1).clamp(1, MAX_PAGE),
            self.per_page.unwrap_or(12).clamp(1, 100),
        )
    }
}

/// One page of the catalog
#[derive(Debug, Serialize, ToSchema)]
pub struct BookPage {
    pub items: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[cfg(test)]
pub(crate) fn test_book(total: i32, available: i32) -> Book {
    let now = Utc::now();
    Book {
        id: 1,
        isbn: "9780132350884".to_string(),
        title: "Clean Code".to_string(),
        author: "Robert C. Martin".to_string(),
        publisher: None,
        publication_year: Some(2008),
        genre: "Programming".to_string(),
        description: None,
        cover_url: None,
        total_copies: total,
        available_copies: available,
        location: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn_validation() {
        assert!(is_valid_isbn("978-0-13-235088-4"));
        assert!(is_valid_isbn("0 13 235088 X"));
        assert!(!is_valid_isbn("978013235088"));
        assert!(!is_valid_isbn("97801323508X4"));
        assert!(!is_valid_isbn(""));
    }

    #[test]
    fn test_cover_url() {
        assert_eq!(
            cover_url("9780132350884", CoverSize::L),
            "https://covers.openlibrary.org/b/isbn/9780132350884-L.jpg"
        );
        assert_eq!(cover_url("  ", CoverSize::M), "/placeholder-book.png");
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(BookQuery::default().page_bounds(), (1, 12));

        let query = BookQuery {
            page: Some(i64::MAX),
            per_page: Some(i64::MAX),
            ..Default::default()
        };
        let (page, per_page) = query.page_bounds();
        assert_eq!((page, per_page), (MAX_PAGE, 100));
        assert!((page - 1).checked_mul(per_page).is_some());

        let query = BookQuery {
            page: Some(-4),
            per_page: Some(0),
            ..Default::default()
        };
        assert_eq!(query.page_bounds(), (1, 1));
    }

    #[test]
    fn test_issue_and_reserve_gates() {
        let shelf = test_book(2, 1);
        assert!(shelf.ensure_can_issue().is_ok());
        assert!(matches!(shelf.ensure_can_reserve(), Err(AppError::BookAvailable)));

        let out = test_book(1, 0);
        assert!(matches!(out.ensure_can_issue(), Err(AppError::BookUnavailable)));
        assert!(out.ensure_can_reserve().is_ok());
    }

    #[test]
    fn test_resize_keeps_loans_accounted() {
        let book = test_book(5, 2);
        assert_eq!(book.resized_available(7).unwrap(), 4);
        assert_eq!(book.resized_available(3).unwrap(), 0);
        assert!(matches!(book.resized_available(2), Err(AppError::InvalidState(_))));
        assert!(matches!(book.resized_available(-1), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_create_book_validation() {
        let mut book = CreateBook {
            isbn: "9780132350884".to_string(),
            title: "Clean Code".to_string(),
            author: "Robert C. Martin".to_string(),
            publisher: None,
            publication_year: None,
            genre: "Programming".to_string(),
            description: None,
            total_copies: 3,
            location: None,
        };
        assert!(book.validate().is_ok());
        book.isbn = "12-34".to_string();
        assert!(book.validate().is_err());
    }
}
