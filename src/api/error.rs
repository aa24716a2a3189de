use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Handler errors. Bodies are plain text.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Logs an upstream failure and hides it behind the route's fixed message.
    pub fn upstream(message: &str, err: anyhow::Error) -> Self {
        tracing::error!("{}: {:?}", message, err);
        AppError::Internal(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Internal(msg) => msg,
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::NotFound("Image not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::upstream("Error fetching images", anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::PayloadTooLarge("File too large".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
