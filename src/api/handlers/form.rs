use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::State,
    http::{Method, header},
    response::IntoResponse,
};

/// Serves the static upload form from disk.
///
/// The file is read on every request so edits show up without a restart.
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let content = tokio::fs::read_to_string(&state.config.index_path)
        .await
        .map_err(|e| {
            tracing::warn!(
                "Failed to read {}: {}",
                state.config.index_path.display(),
                e
            );
            AppError::NotFound("index.html not found".to_string())
        })?;

    Ok((
        [(header::CONTENT_TYPE, mime::TEXT_HTML_UTF_8.to_string())],
        content,
    ))
}

pub async fn not_found(method: Method) -> AppError {
    if method == Method::GET || method == Method::HEAD {
        AppError::NotFound("File not found".to_string())
    } else {
        AppError::NotFound("Endpoint not found".to_string())
    }
}
