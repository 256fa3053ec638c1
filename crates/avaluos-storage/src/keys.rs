//! Shared object-name validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject names that are empty, contain a path separator or `..`.
pub fn validate_object_name(name: &str) -> StorageResult<()> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidKey("Object name is empty".to_string()));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Object name contains invalid characters: {}",
            name
        )));
    }
    Ok(())
}
