use crate::keys::validate_object_name;
use crate::traits::{PutObjectOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects are written to `{base_path}/{bucket}/{name}`. Signed URLs have the
/// form `{base_url}/{bucket}/{name}?expires={unix}&signature={token}` where the
/// token is an HMAC-SHA256 over the name and the expiry, so whatever serves
/// the directory can check them with [`LocalStorage::verify_signed_url`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/avaluos")
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:8080/files")
    /// * `bucket` - Bucket directory below `base_path`
    /// * `signing_secret` - HMAC key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let bucket_path = base_path.join(&bucket);

        fs::create_dir_all(&bucket_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                bucket_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            bucket,
            signing_secret: signing_secret.into(),
        })
    }

    fn object_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_object_name(name)?;
        Ok(self.base_path.join(&self.bucket).join(name))
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            urlencoding::encode(name)
        )
    }

    fn signature(&self, name: &str, expires: u64) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(name.as_bytes());
        mac.update(b":");
        mac.update(&expires.to_be_bytes());
        let tag = mac.finalize().into_bytes();
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag))
    }

    /// Check a URL produced by `signed_url` and return the object name it grants.
    pub fn verify_signed_url(&self, url: &str) -> StorageResult<String> {
        let (path, query) = url
            .split_once('?')
            .ok_or_else(|| StorageError::SigningFailed("Missing signature".to_string()))?;

        let prefix = format!("{}/{}/", self.base_url.trim_end_matches('/'), self.bucket);
        let encoded = path
            .strip_prefix(&prefix)
            .ok_or_else(|| StorageError::SigningFailed("URL outside this bucket".to_string()))?;
        let name = urlencoding::decode(encoded)
            .map_err(|_| StorageError::SigningFailed("Malformed object name".to_string()))?;
        let name = name.as_ref();
        validate_object_name(name)?;

        let mut expires = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => expires = value.parse::<u64>().ok(),
                Some(("signature", value)) => signature = Some(value),
                _ => {}
            }
        }

        let expires =
            expires.ok_or_else(|| StorageError::SigningFailed("Missing expiry".to_string()))?;
        let signature =
            signature.ok_or_else(|| StorageError::SigningFailed("Missing signature".to_string()))?;

        let provided = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| StorageError::SigningFailed("Malformed signature".to_string()))?;
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(name.as_bytes());
        mac.update(b":");
        mac.update(&expires.to_be_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| StorageError::SigningFailed("Invalid signature".to_string()))?;

        if unix_now() > expires {
            return Err(StorageError::SigningFailed("Signed URL has expired".to_string()));
        }

        Ok(name.to_string())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_object(
        &self,
        name: &str,
        data: Vec<u8>,
        options: &PutObjectOptions,
    ) -> StorageResult<()> {
        let path = self.object_path(name)?;
        let size = data.len();

        if !options.overwrite && fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(name.to_string()));
        }

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            name = %name,
            size_bytes = size,
            content_type = %options.content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn get_object(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn signed_url(&self, name: &str, expires_in: Duration) -> StorageResult<String> {
        let path = self.object_path(name)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let expires = unix_now() + expires_in.as_secs();
        let signature = self.signature(name, expires)?;

        Ok(format!(
            "{}?expires={}&signature={}",
            self.object_url(name),
            expires,
            signature
        ))
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.object_path(name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    async fn storage(dir: &std::path::Path) -> LocalStorage {
        LocalStorage::new(
            dir,
            "http://localhost:8080/files".to_string(),
            "documentos-avaluos".to_string(),
            SECRET,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put_object(
                "ABC123_predial.pdf",
                b"%PDF-1.4".to_vec(),
                &PutObjectOptions::overwrite("application/pdf"),
            )
            .await
            .unwrap();

        assert!(storage.exists("ABC123_predial.pdf").await.unwrap());
        let data = storage.get_object("ABC123_predial.pdf").await.unwrap();
        assert_eq!(data, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let options = PutObjectOptions::overwrite("image/png").with_cache_control("max-age=3600");

        storage
            .put_object("F99_P7_luz.png", b"first".to_vec(), &options)
            .await
            .unwrap();
        storage
            .put_object("F99_P7_luz.png", b"second".to_vec(), &options)
            .await
            .unwrap();

        assert_eq!(storage.get_object("F99_P7_luz.png").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_create_only_rejects_existing() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let mut options = PutObjectOptions::overwrite("image/png");
        options.overwrite = false;

        storage
            .put_object("a.png", b"1".to_vec(), &options)
            .await
            .unwrap();
        let result = storage.put_object("a.png", b"2".to_vec(), &options).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.get_object("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_signed_url_round_trip() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        storage
            .put_object(
                "ABC123_predial.pdf",
                b"x".to_vec(),
                &PutObjectOptions::overwrite("application/pdf"),
            )
            .await
            .unwrap();

        let url = storage
            .signed_url("ABC123_predial.pdf", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with(
            "http://localhost:8080/files/documentos-avaluos/ABC123_predial.pdf?expires="
        ));
        assert_eq!(storage.verify_signed_url(&url).unwrap(), "ABC123_predial.pdf");
    }

    #[tokio::test]
    async fn test_signed_url_escapes_reserved_characters() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        for name in ["SHIT#7_predial.pdf", "A 100%25_predial.pdf"] {
            storage
                .put_object(name, b"x".to_vec(), &PutObjectOptions::overwrite("application/pdf"))
                .await
                .unwrap();

            let url = storage
                .signed_url(name, Duration::from_secs(3600))
                .await
                .unwrap();
            let path = url.split('?').next().unwrap();
            assert!(!path.contains('#') && !path.contains(' '), "{}", url);
            assert_eq!(storage.verify_signed_url(&url).unwrap(), name);
            assert_eq!(
                avaluos_core::object_name_from_reference(&url).as_deref(),
                Some(name)
            );
        }
    }

    #[tokio::test]
    async fn test_tampered_signed_url_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        for name in ["a.pdf", "b.pdf"] {
            storage
                .put_object(name, b"x".to_vec(), &PutObjectOptions::overwrite("application/pdf"))
                .await
                .unwrap();
        }

        let url = storage
            .signed_url("a.pdf", Duration::from_secs(60))
            .await
            .unwrap();
        let tampered = url.replace("a.pdf", "b.pdf");
        assert!(matches!(
            storage.verify_signed_url(&tampered),
            Err(StorageError::SigningFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_signed_url_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let expires = unix_now() - 10;
        let signature = storage.signature("a.pdf", expires).unwrap();
        let url = format!(
            "http://localhost:8080/files/documentos-avaluos/a.pdf?expires={}&signature={}",
            expires, signature
        );
        assert!(matches!(
            storage.verify_signed_url(&url),
            Err(StorageError::SigningFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_signed_url_for_missing_object() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let result = storage.signed_url("missing.pdf", Duration::from_secs(60)).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
