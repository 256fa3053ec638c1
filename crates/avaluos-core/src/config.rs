//! Configuration module
//!
//! Configuration is read from the process environment (after loading `.env`
//! with dotenvy). Every setting has a default except the database URL and the
//! credentials of the selected storage backend.

use std::env;
use std::time::Duration;

use crate::constants::{
    ALLOWED_CONTENT_TYPES, DEFAULT_BUCKET, MAX_UPLOAD_SIZE_BYTES, REFRESH_INTERVAL,
    SIGNED_URL_TTL, UPLOAD_CACHE_CONTROL,
};
use crate::storage_types::StorageBackend;
use crate::validation::UploadValidator;

const DB_MAX_CONNECTIONS: u32 = 5;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub storage_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub storage_signing_secret: Option<String>,
    // Upload workflow
    pub max_upload_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub signed_url_ttl: Duration,
    pub upload_cache_control: String,
    // Query layer
    pub refresh_interval: Duration,
    // Identity
    pub access_token: Option<String>,
    pub jwt_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database_url: None,
            db_max_connections: DB_MAX_CONNECTIONS,
            storage_backend: StorageBackend::S3,
            storage_bucket: DEFAULT_BUCKET.to_string(),
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            local_storage_base_url: None,
            storage_signing_secret: None,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_BYTES,
            allowed_content_types: ALLOWED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            signed_url_ttl: SIGNED_URL_TTL,
            upload_cache_control: UPLOAD_CACHE_CONTROL.to_string(),
            refresh_interval: REFRESH_INTERVAL,
            access_token: None,
            jwt_secret: None,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => defaults.storage_backend,
        };

        let allowed_content_types = non_empty("ALLOWED_CONTENT_TYPES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_content_types);

        let config = Config {
            environment: non_empty("ENVIRONMENT")
                .or_else(|| non_empty("APP_ENV"))
                .unwrap_or(defaults.environment),
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: parse_or(non_empty("DB_MAX_CONNECTIONS"), DB_MAX_CONNECTIONS),
            storage_backend,
            storage_bucket: non_empty("STORAGE_BUCKET").unwrap_or(defaults.storage_bucket),
            s3_region: non_empty("S3_REGION").or_else(|| non_empty("AWS_REGION")),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            storage_signing_secret: non_empty("STORAGE_SIGNING_SECRET"),
            max_upload_size_bytes: parse_or(
                non_empty("MAX_UPLOAD_SIZE_BYTES"),
                MAX_UPLOAD_SIZE_BYTES,
            ),
            allowed_content_types,
            signed_url_ttl: Duration::from_secs(parse_or(
                non_empty("SIGNED_URL_TTL_SECS"),
                SIGNED_URL_TTL.as_secs(),
            )),
            upload_cache_control: non_empty("UPLOAD_CACHE_CONTROL")
                .unwrap_or(defaults.upload_cache_control),
            refresh_interval: Duration::from_secs(parse_or(
                non_empty("REFRESH_INTERVAL_SECS"),
                REFRESH_INTERVAL.as_secs(),
            )),
            access_token: non_empty("AVALUOS_ACCESS_TOKEN"),
            jwt_secret: non_empty("JWT_SECRET"),
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(ref url) = self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.storage_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_BUCKET must not be empty"));
        }

        if self.storage_backend == StorageBackend::Local {
            if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL"
                ));
            }
            match self.storage_signing_secret {
                Some(ref secret) if secret.len() >= 32 => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "STORAGE_SIGNING_SECRET must be at least 32 characters long"
                    ))
                }
            }
            let serves_https = self
                .local_storage_base_url
                .as_deref()
                .is_some_and(|url| url.starts_with("https://"));
            if self.is_production() && !serves_https {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_BASE_URL must use https in production"
                ));
            }
        }

        if self.signed_url_ttl.is_zero() {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be positive"));
        }

        if self.refresh_interval.is_zero() {
            return Err(anyhow::anyhow!("REFRESH_INTERVAL_SECS must be positive"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES must not be empty"));
        }

        Ok(())
    }

    /// Validator built from the configured limits
    pub fn upload_validator(&self) -> UploadValidator {
        UploadValidator::new(self.max_upload_size_bytes, self.allowed_content_types.clone())
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.storage_bucket, "documentos-avaluos");
        assert_eq!(config.storage_backend, StorageBackend::S3);
        assert_eq!(config.max_upload_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.signed_url_ttl, Duration::from_secs(3600));
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.allowed_content_types.len(), 5);
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/avaluos"),
            ("LOCAL_STORAGE_BASE_URL", "https://files.example.com"),
            ("STORAGE_SIGNING_SECRET", "0123456789abcdef0123456789abcdef"),
            ("REFRESH_INTERVAL_SECS", "5"),
            ("AWS_REGION", "us-east-1"),
            ("ENVIRONMENT", "prod"),
        ])
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.s3_region.as_deref(), Some("us-east-1"));
        assert!(config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        let config = config_from(&[("SIGNED_URL_TTL_SECS", "soon")]).unwrap();
        assert_eq!(config.signed_url_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_backend_is_an_error() {
        assert!(config_from(&[("STORAGE_BACKEND", "ftp")]).is_err());
    }

    #[test]
    fn test_local_backend_requires_secret() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/avaluos"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8080/files"),
            ("STORAGE_SIGNING_SECRET", "short"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_url_must_be_postgres() {
        let config = config_from(&[("DATABASE_URL", "mysql://localhost/db")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_local_backend_requires_https() {
        let local = [
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/avaluos"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8080/files"),
            ("STORAGE_SIGNING_SECRET", "0123456789abcdef0123456789abcdef"),
        ];
        assert!(config_from(&local).unwrap().validate().is_ok());

        let mut production = local.to_vec();
        production.push(("ENVIRONMENT", "production"));
        let err = config_from(&production).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("https"));
    }
}
