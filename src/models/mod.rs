use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::Bytes;
use thiserror::Error;

use crate::utils::validation::validate_user_id;

/// Multipart field carrying the user identifier
pub const USER_ID_FIELD: &str = "userId";

/// Multipart field carrying the uploaded export file
pub const CHAT_FILE_FIELD: &str = "chatFile";

/// Reasons an upload is rejected before any conversion work starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Expected multipart/form-data")]
    NotMultipart,

    #[error("Missing userId field")]
    MissingUserId,

    #[error("userId cannot be empty")]
    EmptyUserId,

    #[error("userId must not contain control characters")]
    InvalidUserId,

    #[error("Missing chatFile field")]
    MissingChatFile,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Malformed multipart body: {0}")]
    Malformed(String),

    #[error("Request body exceeds the maximum allowed limit")]
    PayloadTooLarge,
}

impl UploadError {
    fn from_multipart(err: MultipartError) -> Self {
        // `Display` on MultipartError is a fixed string; the cause lives in body_text
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::PayloadTooLarge
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

/// A validated conversion upload.
///
/// Built from the raw multipart stream by [`ConvertRequest::from_multipart`];
/// holding one means both required fields were present and well formed.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub user_id: String,
    pub file_name: String,
    pub contents: Bytes,
}

impl ConvertRequest {
    /// Drain the multipart body and check the required fields.
    ///
    /// Unknown fields are skipped. Missing fields are reported in a fixed
    /// order: `userId` first, then `chatFile`, then its filename.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut user_id: Option<String> = None;
        let mut chat_file: Option<(Option<String>, Bytes)> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(UploadError::from_multipart)?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == USER_ID_FIELD {
                let text = field.text().await.map_err(UploadError::from_multipart)?;
                user_id = Some(text);
            } else if name == CHAT_FILE_FIELD {
                let file_name = field.file_name().map(|s| s.to_string());
                let contents = field.bytes().await.map_err(UploadError::from_multipart)?;
                chat_file = Some((file_name, contents));
            } else if !name.is_empty() {
                tracing::debug!("Ignoring unexpected form field '{}'", name);
            }
        }

        let user_id = validate_user_id(user_id.ok_or(UploadError::MissingUserId)?)?;
        let (file_name, contents) = chat_file.ok_or(UploadError::MissingChatFile)?;
        let file_name = file_name
            .filter(|n| !n.is_empty())
            .ok_or(UploadError::NoFileSelected)?;

        Ok(Self {
            user_id,
            file_name,
            contents,
        })
    }
}

/// Zip archive produced from one conversion, ready to be sent back
#[derive(Debug, Clone)]
pub struct ConvertedArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ConvertedArchive {
    pub fn file_name_for(user_id: &str) -> String {
        format!("chatgpt_converted_{}.zip", user_id)
    }
}
