use thiserror::Error;

/// Failure reported by a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no row with id {0}")]
    MissingRow(i64),
    #[error("store returned no row")]
    EmptyResponse,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("record store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("no plant matches '{0}'")]
    NotFound(String),
    #[error("missing required fields: {}", .missing.join(", "))]
    ValidationFailed { missing: Vec<&'static str> },
    #[error("image upload failed: {0}")]
    UploadFailed(String),
    #[error("admin password rejected")]
    AccessDenied,
    #[error("slug '{slug}' already belongs to plant #{existing_id}")]
    SlugConflict { slug: String, existing_id: i64 },
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
