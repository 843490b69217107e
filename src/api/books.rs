//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{ActionResponse, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::book::{Book, BookPage, BookQuery, CreateBook, UpdateBook},
    AppState,
};

/// Quick search query
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Matched against title, author, ISBN and genre
    pub q: String,
}

/// List books with filters and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "One page of the catalog", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.catalog.list_books(&query).await?;
    Ok(Json(page))
}

/// Quick search, at most 20 results
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search(&query.q).await?;
    Ok(Json(books))
}

/// Books with at least one copy on the shelf
#[utoipa::path(
    get,
    path = "/books/available",
    tag = "books",
    responses(
        (status = 200, description = "Available books", body = Vec<Book>)
    )
)]
pub async fn available_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.available_books().await?;
    Ok(Json(books))
}

/// Distinct genres
#[utoipa::path(
    get,
    path = "/books/genres",
    tag = "books",
    responses(
        (status = 200, description = "Sorted genre names", body = Vec<String>)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let genres = state.services.catalog.genres().await?;
    Ok(Json(genres))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = super::BookAction),
        (status = 400, description = "Invalid book data", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<ActionResponse<Book>>)> {
    let book = state.services.catalog.create_book(&claims, book).await?;
    Ok((StatusCode::CREATED, Json(ActionResponse::ok("Book created", book))))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = super::BookAction),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Fewer copies than are on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(update): Json<UpdateBook>,
) -> AppResult<Json<ActionResponse<Book>>> {
    let book = state.services.catalog.update_book(&claims, id, update).await?;
    Ok(Json(ActionResponse::ok("Book updated", book)))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = super::ActionMessage),
        (status = 403, description = "Administrator role required", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is on loan or has history", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse<()>>> {
    state.services.catalog.delete_book(&claims, id).await?;
    Ok(Json(ActionResponse::done("Book deleted")))
}
