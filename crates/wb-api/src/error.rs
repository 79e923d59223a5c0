//! Maps [`AppError`] onto HTTP responses with plain-text bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;
use wb_core::{AppError, ValidationError};
use wb_hub::HubError;

pub const INVALID_ID: &str = "Invalid ID provided";
pub const UNREADABLE_PAYLOAD: &str = "Unable to decode payload";

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self(err.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn invalid_id() -> Self {
        Self(AppError::InvalidInput(INVALID_ID.into()))
    }

    pub fn unreadable_payload() -> Self {
        Self(AppError::InvalidInput(UNREADABLE_PAYLOAD.into()))
    }

    pub fn thread_not_found(id: u64) -> Self {
        Self(AppError::NotFound("thread".into(), id.to_string()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0 {
            AppError::NotFound(kind, _) => format!("The {kind} you are looking for does not exists."),
            AppError::InvalidInput(message) => message,
            AppError::Validation(e) => e.to_string(),
            other => {
                error!(error = %other, "request failed");
                other.to_string()
            }
        };
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
