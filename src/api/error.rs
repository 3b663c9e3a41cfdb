use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::UploadError;
use crate::services::converter::ConverterError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Conversion error: {0}")]
    ConversionFailed(String),

    #[error("Conversion timeout")]
    ConversionTimeout,

    #[error("{0} command not found")]
    ToolMissing(String),

    #[error("No output files generated")]
    NoOutput,

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::PayloadTooLarge => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<ConverterError> for AppError {
    fn from(err: ConverterError) -> Self {
        match err {
            ConverterError::ToolNotFound { tool } => AppError::ToolMissing(tool),
            ConverterError::Timeout { .. } => AppError::ConversionTimeout,
            ConverterError::Io(e) => AppError::Anyhow(e.into()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Anyhow(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::ConversionFailed(msg) => {
                tracing::error!("Converter failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Conversion error: {}", msg),
                )
            }
            AppError::ConversionTimeout => {
                tracing::error!("Converter timed out");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Conversion timeout".to_string(),
                )
            }
            AppError::ToolMissing(tool) => {
                tracing::error!("Converter tool '{}' is not installed", tool);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{tool} command not found. Please install {tool}."),
                )
            }
            AppError::NoOutput => {
                tracing::error!("Converter produced no output directory");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "No output files generated".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal server error: {}", msg),
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Error processing request: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal server error: {}", e),
                )
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn test_upload_errors_map_to_client_errors() {
        let (status, body) = render(UploadError::MissingUserId.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing userId field");

        let (status, _) = render(UploadError::PayloadTooLarge.into()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_converter_errors_map_to_server_errors() {
        let (status, body) = render(
            ConverterError::ToolNotFound {
                tool: "uv".to_string(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "uv command not found. Please install uv.");

        let (status, body) = render(ConverterError::Timeout { secs: 60 }.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Conversion timeout");
    }

    #[tokio::test]
    async fn test_internal_error_carries_message() {
        let (status, body) = render(AppError::Internal("zip task panicked".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error: zip task panicked");
    }
}
