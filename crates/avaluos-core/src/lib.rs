//! Avalúos Core Library
//!
//! This crate provides the domain models, filter compilation, upload validation,
//! object naming, configuration and error types shared by every avalúos component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod naming;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AppraiserId, Avaluo, AvaluoId, AvaluoQuery, DocumentSet, DocumentSlot, FilterState,
    GridColumn, UploadFile, UploadPhase, UploadSession, UserId,
};
pub use naming::{file_extension, object_name, object_name_from_reference};
pub use storage_types::StorageBackend;
pub use validation::{UploadValidator, ValidationError};
