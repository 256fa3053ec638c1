//! Upload validation
//!
//! Checks run before any network call is made. Size is checked first, then the
//! declared content type.

use crate::constants::{ALLOWED_CONTENT_TYPES, MAX_UPLOAD_SIZE_BYTES};
use crate::models::UploadFile;

/// Validation errors for uploaded documents
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },
}

/// Document upload validator
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(
            MAX_UPLOAD_SIZE_BYTES,
            ALLOWED_CONTENT_TYPES.iter().map(|ct| ct.to_string()).collect(),
        )
    }
}

impl UploadValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Validate file size. The limit itself is accepted.
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate the declared content type against the allow-list
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::UnsupportedContentType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Run every check in order: size, then content type
    pub fn validate(&self, file: &UploadFile) -> Result<(), ValidationError> {
        self.validate_file_size(file.size())?;
        self.validate_content_type(&file.content_type)?;
        Ok(())
    }
}

/// Best-effort content type for a file name, used when the caller does not
/// declare one. Unknown extensions map to `application/octet-stream`.
pub fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("zip") => "application/zip",
        _ => {
            tracing::debug!(filename = %filename, "Unknown extension, using octet-stream");
            "application/octet-stream"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(size: usize, content_type: &str) -> UploadFile {
        UploadFile::new("doc.pdf", content_type, vec![0u8; size])
    }

    #[test]
    fn test_accepts_limit_exactly() {
        let validator = UploadValidator::default();
        assert!(validator
            .validate(&file(MAX_UPLOAD_SIZE_BYTES, "application/pdf"))
            .is_ok());
    }

    #[test]
    fn test_rejects_one_byte_over_limit() {
        let validator = UploadValidator::default();
        let err = validator
            .validate(&file(MAX_UPLOAD_SIZE_BYTES + 1, "application/pdf"))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size: MAX_UPLOAD_SIZE_BYTES + 1,
                max: MAX_UPLOAD_SIZE_BYTES,
            }
        );
    }

    #[test]
    fn test_size_checked_before_type() {
        let validator = UploadValidator::default();
        let err = validator
            .validate(&file(MAX_UPLOAD_SIZE_BYTES + 1, "text/plain"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_allowed_types() {
        let validator = UploadValidator::default();
        for ct in ALLOWED_CONTENT_TYPES {
            assert!(validator.validate_content_type(ct).is_ok(), "{ct}");
        }
        assert!(validator.validate_content_type("IMAGE/PNG").is_ok());
    }

    #[test]
    fn test_rejects_other_types() {
        let validator = UploadValidator::default();
        for ct in ["image/gif", "text/plain", "application/zip", ""] {
            assert!(matches!(
                validator.validate_content_type(ct),
                Err(ValidationError::UnsupportedContentType { .. })
            ));
        }
    }

    #[test]
    fn test_content_type_for_filename() {
        assert_eq!(content_type_for_filename("doc.PDF"), "application/pdf");
        assert_eq!(content_type_for_filename("photo.jpeg"), "image/jpeg");
        assert_eq!(
            content_type_for_filename("contrato.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(content_type_for_filename("noext"), "application/octet-stream");
    }
}
