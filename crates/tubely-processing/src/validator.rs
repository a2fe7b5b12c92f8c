use tubely_core::AppError;

/// Content type validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing content type")]
    MissingContentType,

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingContentType => {
                AppError::UnsupportedMediaType("Missing Content-Type for file".to_string())
            }
            ValidationError::InvalidContentType { allowed, .. } => {
                AppError::UnsupportedMediaType(format!(
                    "Invalid file type. Allowed types: {}",
                    allowed.join(", ")
                ))
            }
        }
    }
}

/// Strip MIME parameters (`; codecs=...`) and surrounding whitespace.
pub fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Allowlist check for declared upload content types.
#[derive(Debug, Clone)]
pub struct ContentTypeValidator {
    allowed_content_types: Vec<String>,
}

impl ContentTypeValidator {
    pub fn new(allowed_content_types: Vec<String>) -> Self {
        Self {
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Returns the normalized type when it is allowed. Parameters are ignored
    /// so `video/mp4; codecs=avc1` is checked as `video/mp4`.
    pub fn validate(&self, content_type: Option<&str>) -> Result<String, ValidationError> {
        let declared = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .ok_or(ValidationError::MissingContentType)?;
        let normalized = normalize_mime_type(declared).to_lowercase();

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: declared.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(normalized)
    }
}
