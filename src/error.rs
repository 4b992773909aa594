// src/error.rs
//! Error taxonomy shared by the aggregator, stores, fetcher and job controller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Aggregation requested over zero videos.
    #[error("no videos to analyze")]
    EmptyInput,

    /// The video fetcher could not retrieve the catalog (network, rate limit, bad channel).
    #[error("fetch failed: {0}")]
    FetchFailure(String),

    /// Persistence was unavailable or returned garbage.
    #[error("store failed: {0}")]
    StoreFailure(String),

    /// No saved analytics for the given channel key.
    #[error("no analytics found for {0}")]
    NotFound(String),

    /// Request body was structurally valid JSON but unusable (e.g. blank URL).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::FetchFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::StoreFailure(_) | AppError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::StoreFailure(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::StoreFailure(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let msg = match &self {
            // Keep the UI-facing wording the frontend already checks for.
            AppError::NotFound(_) => "No analytics found".to_string(),
            other => other.to_string(),
        };
        (
            self.status_code(),
            Json(serde_json::json!({ "error": msg })),
        )
            .into_response()
    }
}
