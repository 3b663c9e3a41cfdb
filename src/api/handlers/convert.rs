use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ConvertRequest, UploadError};
use crate::utils::validation::is_plain_header_value;
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::header,
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// `POST /convert`: multipart `userId` + `chatFile` in, zip archive out.
pub async fn convert_export(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|e| {
        tracing::warn!("Rejected non-multipart upload: {}", e);
        UploadError::NotMultipart
    })?;

    let request = ConvertRequest::from_multipart(multipart).await?;
    let archive = state.conversion.convert(&request).await?;

    let content_length = archive.bytes.len().to_string();
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&archive.file_name),
            ),
            (header::CONTENT_LENGTH, content_length),
        ],
        archive.bytes,
    )
        .into_response())
}

/// `attachment; filename="<name>"`, with an RFC 5987 `filename*` added when
/// the name cannot travel as a plain quoted string.
pub fn attachment_disposition(file_name: &str) -> String {
    if is_plain_header_value(file_name) {
        return format!("attachment; filename=\"{}\"", file_name);
    }

    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (' '..='~').contains(&c) && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(file_name, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
