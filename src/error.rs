//! Engine error types and HTTP response mapping.
//!
//! Defines `AppError` for every failure an engine operation can surface and
//! implements Axum's `IntoResponse` so handlers can return it directly with a
//! JSON error body.
//!
//! Error mappings:
//! - `RepoNotFound`, `RevisionNotFound`, `PathNotFound`, `FileNotFoundAtRevision`,
//!   `ObjectNotFound` → 404
//! - `Parse`, `NotAFile`, `BinaryContent` → 400
//! - `UnsupportedForBareRepository`, `CheckoutConflict`, `BranchExists` → 409
//! - `Cancelled` → 503
//! - `Git`, `Internal` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Underlying object store failure (corruption, I/O).
    #[error("Repository error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("File {path} not found at revision {revision}")]
    FileNotFoundAtRevision { path: String, revision: String },

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Operation requires a working directory: {0}")]
    UnsupportedForBareRepository(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("File is not valid UTF-8: {0}")]
    BinaryContent(String),

    #[error("{0}")]
    CheckoutConflict(String),

    #[error("Branch already exists: {0}")]
    BranchExists(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::RepoNotFound(_)
            | AppError::RevisionNotFound(_)
            | AppError::PathNotFound(_)
            | AppError::FileNotFoundAtRevision { .. }
            | AppError::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Parse(_) | AppError::NotAFile(_) | AppError::BinaryContent(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnsupportedForBareRepository(_)
            | AppError::CheckoutConflict(_)
            | AppError::BranchExists(_) => StatusCode::CONFLICT,
            AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Git(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
