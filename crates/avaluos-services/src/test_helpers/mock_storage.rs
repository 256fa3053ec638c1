//! Mock storage implementation for testing

use async_trait::async_trait;
use avaluos_storage::{PutObjectOptions, Storage, StorageBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory object store issuing fake signed URLs
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, (Vec<u8>, PutObjectOptions)>>>,
    puts: Arc<AtomicUsize>,
    signs: Arc<AtomicUsize>,
    last_signed_ttl: Arc<Mutex<Option<Duration>>>,
    fail_puts: Arc<AtomicBool>,
    put_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.lock().unwrap().contains_key(name)
    }

    pub fn put_options(&self, name: &str) -> Option<PutObjectOptions> {
        self.objects
            .lock()
            .unwrap()
            .get(name)
            .map(|(_, options)| options.clone())
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Sleep this long in every `put_object` call
    pub fn delay_puts(&self, delay: Duration) {
        *self.put_delay.lock().unwrap() = Some(delay);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn sign_count(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
    }

    pub fn last_signed_ttl(&self) -> Option<Duration> {
        *self.last_signed_ttl.lock().unwrap()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put_object(
        &self,
        name: &str,
        data: Vec<u8>,
        options: &PutObjectOptions,
    ) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        let delay = *self.put_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
        }

        let mut objects = self.objects.lock().unwrap();
        if !options.overwrite && objects.contains_key(name) {
            return Err(StorageError::AlreadyExists(name.to_string()));
        }
        objects.insert(name.to_string(), (data, options.clone()));
        Ok(())
    }

    async fn get_object(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(name)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn signed_url(&self, name: &str, expires_in: Duration) -> StorageResult<String> {
        let n = self.signs.fetch_add(1, Ordering::SeqCst);
        *self.last_signed_ttl.lock().unwrap() = Some(expires_in);

        if !self.contains(name) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        Ok(format!(
            "https://storage.test/object/sign/documentos-avaluos/{}?token=signed-{}&expires_in={}",
            name,
            n,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.contains(name))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
