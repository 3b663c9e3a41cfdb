use crate::models::UploadError;

/// Checks the submitted user identifier.
///
/// The value is forwarded verbatim to the converter and embedded in the
/// download filename, so it must be non-blank and free of control characters.
pub fn validate_user_id(user_id: String) -> Result<String, UploadError> {
    if user_id.trim().is_empty() {
        return Err(UploadError::EmptyUserId);
    }

    if user_id.chars().any(|c| c.is_control()) {
        tracing::warn!("Rejected userId containing control characters");
        return Err(UploadError::InvalidUserId);
    }

    Ok(user_id)
}

/// Validates that the staged export is well-formed JSON.
///
/// Only syntax is checked; the converter owns the schema.
pub fn validate_export_json(contents: &[u8]) -> Result<(), serde_json::Error> {
    serde_json::from_slice::<serde::de::IgnoredAny>(contents).map(|_| ())
}

/// True when `value` can be sent as a quoted HTTP header parameter as-is
pub fn is_plain_header_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\')
}
