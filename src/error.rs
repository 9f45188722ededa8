use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::export::ExportError;
use crate::jobs::JobError;
use crate::models::FieldError;
use crate::scrape::ScrapeError;

/// Errors surfaced by the HTTP layer, rendered as `{"message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Product is not ready for generation.")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Job(#[from] JobError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Scrape(ScrapeError::InvalidUrl) => StatusCode::BAD_REQUEST,
            ApiError::Scrape(ScrapeError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Scrape(ScrapeError::Upstream { status, .. }) => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Export(ExportError::Empty) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Job(JobError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Job(JobError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::Job(JobError::DomainNotAllowed(_)) => StatusCode::FORBIDDEN,
            ApiError::Job(JobError::QueueClosed) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "❌ {}", self);
        } else {
            warn!(%status, "{}", self);
        }
        let body = match &self {
            ApiError::Validation(errors) => json!({ "message": self.to_string(), "errors": errors }),
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
