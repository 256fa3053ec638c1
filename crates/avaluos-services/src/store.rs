//! Application state: filters and the upload session.
//!
//! Filter changes are published on a watch channel that the refresh task
//! follows. Upload errors never escape [`DocumentTracker::upload_document`];
//! they end up in the session as user-facing text.

use std::sync::{Arc, Mutex, MutexGuard};

use avaluos_core::{
    AppError, Avaluo, AvaluoId, DocumentSlot, ErrorMetadata, FilterState, GridColumn, LogLevel,
    UploadFile, UploadPhase, UploadSession,
};
use tokio::sync::watch;

use crate::query::DocumentQuery;
use crate::upload::DocumentUploadService;

pub struct DocumentTracker {
    filters: watch::Sender<FilterState>,
    session: Mutex<UploadSession>,
    query: DocumentQuery,
    uploads: DocumentUploadService,
}

impl DocumentTracker {
    pub fn new(query: DocumentQuery, uploads: DocumentUploadService) -> Self {
        Self::with_filters(query, uploads, FilterState::default())
    }

    pub fn with_filters(
        query: DocumentQuery,
        uploads: DocumentUploadService,
        filters: FilterState,
    ) -> Self {
        let (filters, _) = watch::channel(filters);
        Self {
            filters,
            session: Mutex::new(UploadSession::default()),
            query,
            uploads,
        }
    }

    pub fn query(&self) -> &DocumentQuery {
        &self.query
    }

    pub fn filters(&self) -> FilterState {
        self.filters.borrow().clone()
    }

    /// Receiver notified on every filter change
    pub fn watch_filters(&self) -> watch::Receiver<FilterState> {
        self.filters.subscribe()
    }

    fn update_filters(&self, update: impl FnOnce(&mut FilterState) -> bool) {
        self.filters.send_if_modified(update);
    }

    pub fn set_direccion(&self, value: impl Into<String>) {
        let value = value.into();
        self.update_filters(|f| replace(&mut f.direccion, value));
    }

    pub fn set_folio_shit(&self, value: impl Into<String>) {
        let value = value.into();
        self.update_filters(|f| replace(&mut f.folio_shit, value));
    }

    pub fn set_show_in_progress(&self, value: bool) {
        self.update_filters(|f| replace(&mut f.show_in_progress, value));
    }

    pub fn set_show_closed(&self, value: bool) {
        self.update_filters(|f| replace(&mut f.show_closed, value));
    }

    pub fn set_show_cancelled(&self, value: bool) {
        self.update_filters(|f| replace(&mut f.show_cancelled, value));
    }

    pub fn set_show_sent(&self, value: bool) {
        self.update_filters(|f| replace(&mut f.show_sent, value));
    }

    /// Clear the text filters; status toggles keep their values
    pub fn reset_filters(&self) {
        self.update_filters(|f| {
            let changed = !f.direccion.is_empty() || !f.folio_shit.is_empty();
            f.reset_text();
            changed
        });
    }

    /// Rows for the current filters, from cache when fresh
    pub async fn rows(&self) -> Result<Arc<Vec<Avaluo>>, AppError> {
        self.query.get(&self.filters()).await
    }

    fn session_guard(&self) -> MutexGuard<'_, UploadSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn session(&self) -> UploadSession {
        self.session_guard().clone()
    }

    /// Open an upload session for a grid cell.
    ///
    /// Returns `false`, leaving the session untouched, for the address, folio
    /// and nss columns and for unknown column names.
    pub fn open_upload(&self, avaluo: Avaluo, column: &str) -> bool {
        let Some(slot) = column
            .parse::<GridColumn>()
            .ok()
            .and_then(|c| c.document_slot())
        else {
            tracing::debug!(column, "Column does not hold documents");
            return false;
        };

        tracing::debug!(avaluo.id = avaluo.id, slot = %slot, "Upload session opened");
        *self.session_guard() = UploadSession::open(avaluo, slot);
        true
    }

    pub fn close_upload(&self) {
        *self.session_guard() = UploadSession::default();
    }

    /// Apply `update` only while the session still runs an attempt for
    /// `avaluo_id`/`slot`. A session closed or retargeted mid-upload is left alone.
    fn update_attempt(
        &self,
        avaluo_id: AvaluoId,
        slot: DocumentSlot,
        update: impl FnOnce(&mut UploadSession),
    ) -> bool {
        let mut session = self.session_guard();
        let current = session.is_uploading
            && session
                .target()
                .is_some_and(|(avaluo, s)| avaluo.id == avaluo_id && s == slot);
        if current {
            update(&mut session);
        }
        current
    }

    fn set_phase(&self, avaluo_id: AvaluoId, slot: DocumentSlot, phase: UploadPhase) {
        self.update_attempt(avaluo_id, slot, |session| session.phase = phase);
    }

    /// Upload `file` into the open session's target cell.
    ///
    /// On success the session is cleared and every cached query invalidated.
    /// On failure the session stays open with the error message set.
    pub async fn upload_document(&self, file: UploadFile) {
        let target = {
            let mut session = self.session_guard();
            let target = session.target().map(|(avaluo, slot)| (avaluo.clone(), slot));
            if target.is_some() {
                session.begin();
            }
            target
        };
        let Some((avaluo, slot)) = target else {
            tracing::warn!("Upload requested without an open session");
            return;
        };

        match self.run_upload(&avaluo, slot, &file).await {
            Ok(url) => {
                tracing::info!(
                    avaluo.id = avaluo.id,
                    slot = %slot,
                    url_len = url.len(),
                    "Upload completed"
                );
                self.query.invalidate_all();
                self.update_attempt(avaluo.id, slot, |session| {
                    *session = UploadSession::default()
                });
            }
            Err(e) => {
                log_upload_error(&e);
                let message = e.client_message();
                if !self.update_attempt(avaluo.id, slot, |session| session.fail(message)) {
                    tracing::debug!(
                        avaluo.id = avaluo.id,
                        slot = %slot,
                        "Upload failed after its session was closed"
                    );
                }
            }
        }
    }

    async fn run_upload(
        &self,
        avaluo: &Avaluo,
        slot: DocumentSlot,
        file: &UploadFile,
    ) -> Result<String, AppError> {
        self.uploads.validate(file)?;

        self.set_phase(avaluo.id, slot, UploadPhase::Uploading);
        let name = self.uploads.store_object(avaluo, slot, file).await?;

        self.set_phase(avaluo.id, slot, UploadPhase::Linking);
        self.uploads.link(avaluo.id, slot, &name).await
    }
}

fn log_upload_error(e: &AppError) {
    let code = e.error_code();
    let recoverable = e.is_recoverable();
    let action = e.suggested_action().unwrap_or("");
    let details = e.detailed_message();
    match e.log_level() {
        LogLevel::Debug => tracing::debug!(
            error.code = code,
            recoverable,
            action,
            error = %details,
            "Upload rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            error.code = code,
            recoverable,
            action,
            error = %details,
            "Upload rejected"
        ),
        LogLevel::Error => tracing::error!(
            error.code = code,
            recoverable,
            action,
            error = %details,
            "Upload failed"
        ),
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
