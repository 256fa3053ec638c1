//! Document upload workflow.
//!
//! An upload is three steps: validate the candidate file locally, store it
//! under its derived object name, then link it by writing a fresh signed URL
//! into the record's slot column. Validation never touches the network. A
//! failure after the object is stored leaves the object in place; the next
//! upload to the same slot overwrites it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use avaluos_core::{
    constants::{SIGNED_URL_TTL, UPLOAD_CACHE_CONTROL},
    object_name, AppError, Avaluo, AvaluoId, Config, DocumentSlot, UploadFile, UploadValidator,
};
use avaluos_db::{AppraiserDirectory, AvaluoStore};
use avaluos_storage::{PutObjectOptions, Storage};

use crate::auth::IdentityProvider;

/// Tunables of the upload workflow
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub validator: UploadValidator,
    pub signed_url_ttl: Duration,
    pub cache_control: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            validator: UploadValidator::default(),
            signed_url_ttl: SIGNED_URL_TTL,
            cache_control: UPLOAD_CACHE_CONTROL.to_string(),
        }
    }
}

impl UploadSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            validator: config.upload_validator(),
            signed_url_ttl: config.signed_url_ttl,
            cache_control: config.upload_cache_control.clone(),
        }
    }
}

#[derive(Clone)]
pub struct DocumentUploadService {
    store: Arc<dyn AvaluoStore>,
    directory: Arc<dyn AppraiserDirectory>,
    storage: Arc<dyn Storage>,
    identity: Arc<dyn IdentityProvider>,
    settings: UploadSettings,
}

impl DocumentUploadService {
    pub fn new(
        store: Arc<dyn AvaluoStore>,
        directory: Arc<dyn AppraiserDirectory>,
        storage: Arc<dyn Storage>,
        identity: Arc<dyn IdentityProvider>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            store,
            directory,
            storage,
            identity,
            settings,
        }
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Size first, then content type
    pub fn validate(&self, file: &UploadFile) -> Result<(), AppError> {
        self.settings.validator.validate(file)?;
        Ok(())
    }

    /// Resolve the uploader, derive the object name and store the bytes.
    ///
    /// Returns the object name.
    #[tracing::instrument(skip(self, avaluo, file), fields(avaluo.id = avaluo.id, slot = %slot, size = file.size()))]
    pub async fn store_object(
        &self,
        avaluo: &Avaluo,
        slot: DocumentSlot,
        file: &UploadFile,
    ) -> Result<String, AppError> {
        let user_id = self
            .identity
            .current_user()
            .await
            .ok_or(AppError::NotAuthenticated)?;

        let appraiser = self
            .directory
            .appraiser_id(user_id)
            .await?
            .ok_or_else(|| AppError::AppraiserNotFound(user_id.to_string()))?;

        let name = object_name(avaluo, &appraiser, slot, &file.file_name)?;

        let options = PutObjectOptions::overwrite(file.content_type.clone())
            .with_cache_control(self.settings.cache_control.clone());

        let start = Instant::now();
        self.storage
            .put_object(&name, file.data.clone(), &options)
            .await?;

        tracing::info!(
            object = %name,
            appraiser = %appraiser,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document stored"
        );
        Ok(name)
    }

    /// Sign the stored object and write the URL into the record's slot.
    ///
    /// Returns the URL written.
    #[tracing::instrument(skip(self), fields(slot = %slot))]
    pub async fn link(
        &self,
        avaluo_id: AvaluoId,
        slot: DocumentSlot,
        name: &str,
    ) -> Result<String, AppError> {
        let url = self
            .storage
            .signed_url(name, self.settings.signed_url_ttl)
            .await?;

        if let Err(e) = self.store.update_document(avaluo_id, slot, &url).await {
            tracing::warn!(
                object = %name,
                avaluo.id = avaluo_id,
                error = %e,
                "Object stored but record not linked"
            );
            return Err(e);
        }

        tracing::info!(object = %name, avaluo.id = avaluo_id, "Document linked");
        Ok(url)
    }

    /// All three steps without progress reporting
    pub async fn upload(
        &self,
        avaluo: &Avaluo,
        slot: DocumentSlot,
        file: &UploadFile,
    ) -> Result<String, AppError> {
        self.validate(file)?;
        let name = self.store_object(avaluo, slot, file).await?;
        self.link(avaluo.id, slot, &name).await
    }
}
