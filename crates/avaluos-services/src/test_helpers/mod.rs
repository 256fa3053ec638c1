//! Test helpers
//!
//! In-memory collaborators and fixtures for exercising the services without a
//! database, object store or auth backend.

pub mod fixtures;
pub mod mock_repositories;
pub mod mock_storage;

pub use fixtures::*;
pub use mock_repositories::{MockAppraiserDirectory, MockAvaluoStore, MockIdentity};
pub use mock_storage::MockStorage;

use std::sync::Arc;

use uuid::Uuid;

use crate::{DocumentQuery, DocumentTracker, DocumentUploadService, UploadSettings};

/// Handles to the mocks behind a tracker built by [`tracker_with_mocks`]
#[derive(Clone)]
pub struct Mocks {
    pub store: MockAvaluoStore,
    pub directory: MockAppraiserDirectory,
    pub storage: MockStorage,
    pub user: Uuid,
}

/// Tracker wired to fresh mocks with one signed-in user.
///
/// The user is mapped to `appraiser` when given.
pub fn tracker_with_mocks(appraiser: Option<&str>) -> (DocumentTracker, Mocks) {
    let user = Uuid::new_v4();
    let store = MockAvaluoStore::new();
    let directory = MockAppraiserDirectory::new();
    let storage = MockStorage::new();
    if let Some(appraiser) = appraiser {
        directory.assign(user, appraiser.into());
    }

    let query = DocumentQuery::new(Arc::new(store.clone()));
    let uploads = DocumentUploadService::new(
        Arc::new(store.clone()),
        Arc::new(directory.clone()),
        Arc::new(storage.clone()),
        Arc::new(MockIdentity::new(Some(user))),
        UploadSettings::default(),
    );

    (
        DocumentTracker::new(query, uploads),
        Mocks {
            store,
            directory,
            storage,
            user,
        },
    )
}
