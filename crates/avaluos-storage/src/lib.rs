//! Avalúos Storage Library
//!
//! Object-storage abstraction for uploaded documents, with an S3-compatible
//! backend (through `object_store`) and a local-filesystem backend.
//!
//! # Object names
//!
//! Objects live at the root of the configured bucket under their derived name
//! (`{base}_{slot}.{ext}`, see `avaluos_core::naming`). Names must be a single
//! path segment: no `/`, no `..`, not empty. Validation is centralized in the
//! `keys` module so all backends agree.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use avaluos_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{PutObjectOptions, Storage, StorageError, StorageResult};
