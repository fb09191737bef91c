//! # contract: records and trait seams for the backup pipeline
//!
//! This module defines the typed records flowing through the pipeline
//! (datasets, resources, stored objects) and the traits behind which the
//! external collaborators live: the catalog endpoint, the resource fetcher
//! and the object store. The engines in [`crate::backup`], [`crate::dedup`]
//! and [`crate::admin`] only ever talk to these traits.
//!
//! All traits are annotated for `mockall` so tests can drive the engines
//! against deterministic mocks; the generated mocks are exported through the
//! default-on `test-export-mocks` feature, like the rest of the crate's
//! test surface.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::error::{CatalogError, FetchError, StoreError};

/// A catalog dataset: a named collection of resources with a stable
/// identity and a category tag.
///
/// Datasets are owned by the external catalog and re-derived every run;
/// nothing here is persisted.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Stable catalog identifier; the dataset's bucket name derives from it.
    pub id: String,
    pub title: String,
    /// Category tag, e.g. "public-transit".
    pub kind: String,
    pub resources: Vec<Resource>,
}

/// One downloadable file described by a dataset's catalog entry.
///
/// Identity is the pair (owning dataset id, title); there is no single id
/// field. A `Resource` is an immutable snapshot of one catalog fetch.
#[derive(Debug, Clone)]
pub struct Resource {
    pub title: String,
    pub url: String,
    pub format: Option<String>,
    /// Source-declared last-modification time, kept raw. It is parsed only
    /// when a staleness comparison actually needs it, so a malformed value
    /// surfaces exactly there.
    pub updated_at: Option<String>,
    /// Calendar validity bounds, passed through to upload metadata verbatim.
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
}

/// An object already stored in a dataset bucket, as returned by listings.
///
/// Listings do not carry user metadata; read it separately with
/// [`ObjectStore::object_metadata`].
#[derive(Debug, Clone)]
pub struct BackupObject {
    pub key: String,
    /// Store-assigned modification time.
    pub last_modified: DateTime<Utc>,
    pub size: Option<i64>,
    pub etag: Option<String>,
}

/// Totals accumulated over a full backup run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub total_seen: usize,
    pub in_scope: usize,
    pub backed_up: usize,
}

/// Structured pipeline events, recorded through [`Reporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupEvent {
    ResourceSeen { dataset: String, resource: String },
    ResourceOutOfScope { dataset: String, resource: String },
    ResourceFresh { resource: String },
    ResourceBackedUp { bucket: String, key: String },
    ResourceFailed { resource: String, reason: String },
    BucketUnavailable { bucket: String, reason: String },
    DuplicateDeleted { bucket: String, key: String },
}

/// Trait for the catalog endpoint listing datasets with their resources.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch and normalize the full dataset listing. Resources without a
    /// retrievable URL are dropped here, at the boundary.
    async fn list_datasets(&self) -> Result<Vec<Dataset>, CatalogError>;
}

/// Trait for fetching resource bytes and probing resource headers.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download the resource bytes, following redirects.
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// HEAD the resource, following one `location` hop. Header names come
    /// back lowercased. Probing only; never authoritative for staleness.
    async fn head(&self, url: &str) -> Result<HashMap<String, String>, FetchError>;
}

/// Trait for the object store: bucket-per-dataset addressing, prefix
/// listings, uploads with attached metadata, deletions.
///
/// The store is assumed to offer read-after-write listing consistency for
/// this workload: a successful put is visible to the next listing.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if absent; "already exists" is success.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    /// List objects under `prefix` (empty prefix lists the whole bucket).
    /// Unordered with respect to time; callers reduce explicitly.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<BackupObject>, StoreError>;

    /// Read the user metadata attached to one object.
    async fn object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError>;

    /// Upload the file at `local_path` under `key`, attaching `metadata`
    /// and marking the object publicly readable.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &HashMap<String, String>,
    ) -> Result<(), StoreError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// Delete an empty bucket. Member objects must be deleted first.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError>;
}

/// Injected sink for pipeline events, so tests assert on what happened
/// instead of parsing log output.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Reporter: Send + Sync {
    fn record(&self, event: BackupEvent);
}

/// Production reporter: forwards every event to `tracing`.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, event: BackupEvent) {
        match event {
            BackupEvent::ResourceSeen { dataset, resource } => {
                tracing::debug!(dataset = %dataset, resource = %resource, "Resource seen")
            }
            BackupEvent::ResourceOutOfScope { dataset, resource } => {
                tracing::debug!(dataset = %dataset, resource = %resource, "Resource out of scope")
            }
            BackupEvent::ResourceFresh { resource } => {
                tracing::debug!(resource = %resource, "Resource already backed up")
            }
            BackupEvent::ResourceBackedUp { bucket, key } => {
                tracing::info!(bucket = %bucket, key = %key, "Resource backed up")
            }
            BackupEvent::ResourceFailed { resource, reason } => {
                tracing::warn!(resource = %resource, reason = %reason, "Resource failed")
            }
            BackupEvent::BucketUnavailable { bucket, reason } => {
                tracing::warn!(bucket = %bucket, reason = %reason, "Bucket unavailable")
            }
            BackupEvent::DuplicateDeleted { bucket, key } => {
                tracing::info!(bucket = %bucket, key = %key, "Duplicate deleted")
            }
        }
    }
}
