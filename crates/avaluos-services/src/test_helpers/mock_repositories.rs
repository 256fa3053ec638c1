//! Mock collaborator implementations for testing
//!
//! These mocks allow testing the services without database or auth backend.

use async_trait::async_trait;
use avaluos_core::{AppError, AppraiserId, Avaluo, AvaluoId, AvaluoQuery, DocumentSlot, UserId};
use avaluos_db::{AppraiserDirectory, AvaluoStore};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::IdentityProvider;

/// Mock records table
#[derive(Clone, Default)]
pub struct MockAvaluoStore {
    records: Arc<Mutex<BTreeMap<AvaluoId, Avaluo>>>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    queries: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
    fail_queries: Arc<AtomicBool>,
    fail_updates: Arc<AtomicBool>,
}

impl MockAvaluoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, avaluo: Avaluo) {
        self.records.lock().unwrap().insert(avaluo.id, avaluo);
    }

    pub fn record(&self, id: AvaluoId) -> Option<Avaluo> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    /// Delay applied to the next query call
    pub fn push_delay(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvaluoStore for MockAvaluoStore {
    async fn query(&self, query: &AvaluoQuery) -> Result<Vec<Avaluo>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::Query("connection reset".to_string()));
        }

        let records = self.records.lock().unwrap();
        Ok(query.apply(records.values()))
    }

    async fn get(&self, id: AvaluoId) -> Result<Option<Avaluo>, AppError> {
        Ok(self.record(id))
    }

    async fn update_document(
        &self,
        id: AvaluoId,
        slot: DocumentSlot,
        reference: &str,
    ) -> Result<(), AppError> {
        self.updates.fetch_add(1, Ordering::SeqCst);

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Update("row is locked".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        let avaluo = records
            .get_mut(&id)
            .ok_or_else(|| AppError::Update(format!("Avalúo {} no encontrado", id)))?;
        avaluo.documents.set(slot, Some(reference.to_string()));
        Ok(())
    }
}

/// Mock role-mapping table
#[derive(Clone, Default)]
pub struct MockAppraiserDirectory {
    appraisers: Arc<Mutex<HashMap<UserId, AppraiserId>>>,
}

impl MockAppraiserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, user_id: UserId, appraiser: AppraiserId) {
        self.appraisers.lock().unwrap().insert(user_id, appraiser);
    }
}

#[async_trait]
impl AppraiserDirectory for MockAppraiserDirectory {
    async fn appraiser_id(&self, user_id: UserId) -> Result<Option<AppraiserId>, AppError> {
        Ok(self.appraisers.lock().unwrap().get(&user_id).cloned())
    }
}

/// Fixed identity
#[derive(Clone)]
pub struct MockIdentity {
    user: Option<UserId>,
}

impl MockIdentity {
    pub fn new(user: Option<UserId>) -> Self {
        Self { user }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn current_user(&self) -> Option<UserId> {
        self.user
    }
}
