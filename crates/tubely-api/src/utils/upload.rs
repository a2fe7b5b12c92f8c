//! Request helpers shared by the upload handlers

use axum::extract::multipart::MultipartError;
use axum::http::{header::CONTENT_LENGTH, HeaderMap};
use tubely_core::constants::MULTIPART_OVERHEAD_BYTES;
use tubely_core::AppError;
use uuid::Uuid;

/// Parse a path segment as a video ID.
pub fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid ID".to_string()))
}

/// Reject requests whose declared length already exceeds the file ceiling
/// plus room for multipart framing. The streamed copy still enforces the
/// ceiling for bodies without a Content-Length.
pub fn check_declared_length(headers: &HeaderMap, max_file_bytes: u64) -> Result<(), AppError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(len) if len > max_file_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES) => {
            Err(AppError::PayloadTooLarge(format!(
                "File exceeds maximum size of {} bytes",
                max_file_bytes
            )))
        }
        _ => Ok(()),
    }
}

pub fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Couldn't parse multipart body: {}", err))
}

pub fn missing_field(name: &str) -> AppError {
    AppError::BadRequest(format!("Missing '{}' field in multipart body", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_video_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_video_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_video_id("not-a-uuid"),
            Err(AppError::InvalidInput(msg)) if msg == "Invalid ID"
        ));
    }

    #[test]
    fn test_declared_length_check() {
        let mut headers = HeaderMap::new();
        assert!(check_declared_length(&headers, 10).is_ok());

        headers.insert(
            CONTENT_LENGTH,
            HeaderValue::from(10 + MULTIPART_OVERHEAD_BYTES),
        );
        assert!(check_declared_length(&headers, 10).is_ok());

        headers.insert(
            CONTENT_LENGTH,
            HeaderValue::from(11 + MULTIPART_OVERHEAD_BYTES),
        );
        assert!(matches!(
            check_declared_length(&headers, 10),
            Err(AppError::PayloadTooLarge(_))
        ));
    }
}
