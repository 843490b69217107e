//! Error types for the circulation server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Failure taxonomy shared by every circulation operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    ResourceExhausted,
    DuplicateActive,
    Unauthorized,
    BadValue,
    StorageFailure,
}

/// Stable numeric error codes exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthenticated = 2,
    NotAuthorized = 3,
    DbFailure = 4,
    NoSuchData = 5,
    NoSuchFine = 6,
    BadValue = 7,
    InvalidState = 8,
    AlreadyReturned = 9,
    BookAvailable = 10,
    BookUnavailable = 11,
    DuplicateLoan = 12,
    DuplicatePending = 13,
    AlreadyBorrowed = 14,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Fine {0} not found")]
    FineNotFound(i32),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Transaction {0} has already been returned")]
    AlreadyReturned(i32),

    #[error("Book is currently available, borrow it directly")]
    BookAvailable,

    #[error("Book is not available")]
    BookUnavailable,

    #[error("Borrower already has this book issued")]
    DuplicateLoan,

    #[error("Duplicate pending {0}")]
    DuplicatePending(&'static str),

    #[error("Member already has this book borrowed")]
    AlreadyBorrowed,

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Authentication(_) | AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::NotFound(_) | AppError::FineNotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_) => ErrorKind::BadValue,
            AppError::InvalidState(_) | AppError::AlreadyReturned(_) | AppError::BookAvailable => {
                ErrorKind::InvalidState
            }
            AppError::BookUnavailable => ErrorKind::ResourceExhausted,
            AppError::DuplicateLoan | AppError::DuplicatePending(_) | AppError::AlreadyBorrowed => {
                ErrorKind::DuplicateActive
            }
            AppError::Storage(_) | AppError::Internal(_) => ErrorKind::StorageFailure,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) => ErrorCode::NotAuthenticated,
            AppError::Unauthorized(_) => ErrorCode::NotAuthorized,
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::FineNotFound(_) => ErrorCode::NoSuchFine,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::InvalidState(_) => ErrorCode::InvalidState,
            AppError::AlreadyReturned(_) => ErrorCode::AlreadyReturned,
            AppError::BookAvailable => ErrorCode::BookAvailable,
            AppError::BookUnavailable => ErrorCode::BookUnavailable,
            AppError::DuplicateLoan => ErrorCode::DuplicateLoan,
            AppError::DuplicatePending(_) => ErrorCode::DuplicatePending,
            AppError::AlreadyBorrowed => ErrorCode::AlreadyBorrowed,
            AppError::Storage(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => match self.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::CONFLICT,
            },
        }
    }

    /// Maps a unique-index violation onto `duplicate`, passing every other
    /// storage error through untouched.
    pub fn on_unique_violation(e: sqlx::Error, duplicate: AppError) -> AppError {
        match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => duplicate,
            _ => AppError::Storage(e),
        }
    }
}

/// Failure envelope
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    pub code: u32,
    pub kind: ErrorKind,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Storage(e) => {
                tracing::error!("Storage failure: {:?}", e);
                self.to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            success: false,
            code: self.code() as u32,
            kind: self.kind(),
            error: message,
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
