//! Per-cell signed-URL resolution.
//!
//! Stored references are never shown as-is: each render signs a fresh URL
//! for the object the reference names. Nothing is cached here.

use std::sync::Arc;
use std::time::Duration;

use avaluos_core::{constants::SIGNED_URL_TTL, object_name_from_reference, Avaluo, DocumentSlot};
use avaluos_storage::Storage;
use futures::future::join_all;

/// Display state of a document cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellLink {
    /// No stored reference
    Empty,
    /// Reference present but no URL (yet); signing failures stay here
    Loading,
    Ready(String),
}

impl CellLink {
    pub fn url(&self) -> Option<&str> {
        match self {
            CellLink::Ready(url) => Some(url),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct LinkResolver {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl LinkResolver {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_ttl(storage, SIGNED_URL_TTL)
    }

    pub fn with_ttl(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    /// Signed URL for a stored reference
    pub async fn resolve(&self, reference: Option<&str>) -> CellLink {
        let Some(name) = reference.and_then(object_name_from_reference) else {
            return CellLink::Empty;
        };

        match self.storage.signed_url(&name, self.ttl).await {
            Ok(url) => CellLink::Ready(url),
            Err(e) => {
                tracing::warn!(object = %name, error = %e, "Failed to sign document URL");
                CellLink::Loading
            }
        }
    }

    /// Every document slot of a row, resolved concurrently, in grid order
    pub async fn resolve_row(&self, avaluo: &Avaluo) -> Vec<(DocumentSlot, CellLink)> {
        let links = join_all(
            DocumentSlot::ALL
                .iter()
                .map(|slot| self.resolve(avaluo.document(*slot))),
        )
        .await;

        DocumentSlot::ALL.into_iter().zip(links).collect()
    }
}
