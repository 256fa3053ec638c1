//! Avalúos Services Layer
//!
//! Orchestration on top of the repositories and the storage backend: the
//! cached query layer with invalidation and subscriptions, the upload
//! workflow, signed-URL resolution for grid cells, the session store that
//! ties them together, identity, and the periodic refresh task.

pub mod auth;
pub mod links;
pub mod query;
pub mod refresh;
pub mod store;
pub mod upload;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use auth::{IdentityProvider, JwtIdentity};
pub use links::{CellLink, LinkResolver};
pub use query::{CachedResult, DocumentQuery, FetchOutcome, QueryEvent};
pub use refresh::RefreshTask;
pub use store::DocumentTracker;
pub use upload::{DocumentUploadService, UploadSettings};

pub use avaluos_db::{AppraiserDirectory, AvaluoStore};
pub use avaluos_storage::{PutObjectOptions, Storage, StorageError};
