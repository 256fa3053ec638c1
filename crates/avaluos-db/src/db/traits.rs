use async_trait::async_trait;
use avaluos_core::{AppError, AppraiserId, Avaluo, AvaluoId, AvaluoQuery, DocumentSlot, UserId};

/// Records collaborator: filtered reads and single-column document updates.
#[async_trait]
pub trait AvaluoStore: Send + Sync {
    /// Records matching `query`, sorted ascending by `folio_shit`.
    ///
    /// Failures are reported as `AppError::Query`; no partial results.
    async fn query(&self, query: &AvaluoQuery) -> Result<Vec<Avaluo>, AppError>;

    /// Single record by id
    async fn get(&self, id: AvaluoId) -> Result<Option<Avaluo>, AppError>;

    /// Write `reference` into the `slot` column of record `id`.
    ///
    /// Failures, including a missing record, are reported as `AppError::Update`.
    async fn update_document(
        &self,
        id: AvaluoId,
        slot: DocumentSlot,
        reference: &str,
    ) -> Result<(), AppError>;
}

/// Role-mapping collaborator: the appraiser associated with a user account.
#[async_trait]
pub trait AppraiserDirectory: Send + Sync {
    /// `None` when the user has no mapping or the mapping has no appraiser.
    async fn appraiser_id(&self, user_id: UserId) -> Result<Option<AppraiserId>, AppError>;
}
