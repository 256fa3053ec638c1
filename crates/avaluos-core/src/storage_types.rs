use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where uploaded documents live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Any S3-compatible object store (AWS, MinIO, Supabase storage)
    #[default]
    S3,
    /// Directory on the local filesystem, served under a base URL
    Local,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Local => "local",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" | "minio" | "supabase" => Ok(StorageBackend::S3),
            "local" | "fs" | "filesystem" => Ok(StorageBackend::Local),
            other => Err(anyhow::anyhow!(
                "Unknown STORAGE_BACKEND '{}' (expected s3 or local)",
                other
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
