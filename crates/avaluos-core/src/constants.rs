//! Application-wide constants.

use std::time::Duration;

/// Default object-storage bucket holding every uploaded document.
pub const DEFAULT_BUCKET: &str = "documentos-avaluos";

/// Upload size limit: 5 MiB.
pub const MAX_UPLOAD_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Content types accepted by the upload workflow.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

/// Lifetime of every signed URL handed out.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Cache directive attached to uploaded objects.
pub const UPLOAD_CACHE_CONTROL: &str = "max-age=3600";

/// Interval of the automatic result-set refresh.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Records table.
pub const AVALUOS_TABLE: &str = "avaluos";

/// Role-mapping table (user id -> appraiser).
pub const USER_ROLES_TABLE: &str = "user_roles";
