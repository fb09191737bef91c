//! Error taxonomy for the backup pipeline.
//!
//! The engines route on these variants: a [`CatalogError`] aborts a run
//! outright, while fetch, upload and per-bucket store failures are
//! recovered at the resource level and reported as warnings.

use thiserror::Error;

/// The remote catalog is unreachable or returned a malformed payload.
/// Fatal for a backup run: nothing downstream is meaningful without it.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed catalog payload: {0}")]
    Malformed(String),
}

/// A single resource's bytes could not be downloaded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("resource fetch for {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// A bucket or object operation failed at the store. SDK errors are
/// carried as display strings so the store client's generics stay out of
/// the public error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    S3(String),
}

/// Umbrella error for engine operations.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A declared update time that cannot be parsed is a data-quality
    /// fault, surfaced rather than defaulted: guessing either skips a real
    /// update or re-downloads unchanged data forever.
    #[error("resource {resource} declares an unusable update time {raw:?}")]
    MalformedTimestamp {
        resource: String,
        raw: Option<String>,
    },

    #[error("staging failed: {0}")]
    Staging(#[source] std::io::Error),
}
