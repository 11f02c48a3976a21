use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::hierarchy::HierarchyError;
use crate::models::{ErrorCode, StatusResponse};
use crate::selector::ParseError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid selector: {0}")]
    Selector(#[from] ParseError),

    #[error("Cannot get screenshot: {0}")]
    Capture(String),

    #[error("Invalid window hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Device error: {0}")]
    Device(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ArgumentInvalid,
            AppError::Selector(_) => ErrorCode::SelectorInvalid,
            AppError::Capture(_) => ErrorCode::CaptureFailed,
            AppError::Hierarchy(_) | AppError::Device(_) | AppError::Internal(_) => {
                ErrorCode::DeviceError
            }
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Selector(_) => StatusCode::BAD_REQUEST,
            AppError::Capture(_)
            | AppError::Hierarchy(_)
            | AppError::Device(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The envelope the client sees for this error
    pub fn to_status(&self) -> StatusResponse {
        StatusResponse::with_code(self.code(), self.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(self.to_status())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    #[test]
    fn test_selector_error_envelope() {
        let err = AppError::from(ParseError::UnknownKey("foo".to_string()));
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);

        let envelope = err.to_status();
        assert_eq!(envelope.status(), Status::Error);
        assert_eq!(envelope.status_code(), Some(ErrorCode::SelectorInvalid.value()));
        assert_eq!(
            envelope.error_message(),
            Some("Invalid selector: Unknown selector key 'foo'")
        );
    }

    #[test]
    fn test_device_error_is_server_error() {
        let err = AppError::from(anyhow::anyhow!("adb not found"));
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), ErrorCode::DeviceError);
    }
}
