//! Backup engine: catalog → policy → store orchestration.
//!
//! One resource at a time: filter by scope, make sure the dataset bucket
//! exists, skip resources a prior backup already satisfies, download and
//! upload the rest. A failing resource is isolated (warned, reported,
//! skipped); only the initial catalog fetch aborts the run.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::contract::{
    BackupEvent, BackupReport, Catalog, Dataset, Fetcher, ObjectStore, Reporter, Resource,
};
use crate::error::BackupError;
use crate::key::{self, KeyClock};
use crate::policy;
use crate::staging::StagingArea;

/// Run a full backup pass over every catalog resource.
///
/// The run always completes once the catalog is in hand; the returned
/// report carries `(backed_up, in_scope, total_seen)`.
pub async fn run_backup<C, F, S, R>(
    catalog: &C,
    fetcher: &F,
    store: &S,
    staging: &StagingArea,
    reporter: &R,
) -> Result<BackupReport, BackupError>
where
    C: Catalog,
    F: Fetcher,
    S: ObjectStore,
    R: Reporter,
{
    info!("[BACKUP] Starting backup run");
    let datasets = catalog.list_datasets().await?;

    let clock = KeyClock::new();
    let mut report = BackupReport::default();

    for dataset in &datasets {
        let bucket = key::bucket_id(&dataset.id);

        for resource in &dataset.resources {
            report.total_seen += 1;
            reporter.record(BackupEvent::ResourceSeen {
                dataset: dataset.title.clone(),
                resource: resource.title.clone(),
            });

            if !policy::in_scope(dataset, resource) {
                debug!(resource = %debug_name(dataset, resource), "[BACKUP] Out of scope, skipping");
                reporter.record(BackupEvent::ResourceOutOfScope {
                    dataset: dataset.title.clone(),
                    resource: resource.title.clone(),
                });
                continue;
            }
            report.in_scope += 1;

            if let Err(err) = store.ensure_bucket(&bucket).await {
                warn!(bucket = %bucket, error = %err, "[BACKUP] Bucket unavailable, skipping resource");
                reporter.record(BackupEvent::BucketUnavailable {
                    bucket: bucket.clone(),
                    reason: err.to_string(),
                });
                continue;
            }

            // Staleness must be judged before any byte of the resource is
            // fetched; a fresh resource costs one listing and nothing else.
            let prefix = key::sanitize_title(&resource.title);
            let existing = match store.list_objects(&bucket, &prefix).await {
                Ok(objects) => objects,
                Err(err) => {
                    warn!(bucket = %bucket, error = %err, "[BACKUP] Listing failed, skipping resource");
                    reporter.record(BackupEvent::BucketUnavailable {
                        bucket: bucket.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            match policy::is_stale(resource, &existing) {
                Ok(false) => {
                    debug!(resource = %debug_name(dataset, resource), "[BACKUP] Already at latest version, skipping");
                    reporter.record(BackupEvent::ResourceFresh {
                        resource: resource.title.clone(),
                    });
                    continue;
                }
                Ok(true) => {}
                Err(err) => {
                    warn!(resource = %debug_name(dataset, resource), error = %err, "[BACKUP] Cannot judge staleness, skipping resource");
                    reporter.record(BackupEvent::ResourceFailed {
                        resource: resource.title.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            }

            match backup_resource(fetcher, store, staging, &clock, &bucket, dataset, resource)
                .await
            {
                Ok(uploaded_key) => {
                    report.backed_up += 1;
                    reporter.record(BackupEvent::ResourceBackedUp {
                        bucket: bucket.clone(),
                        key: uploaded_key,
                    });
                }
                Err(err) => {
                    warn!(resource = %debug_name(dataset, resource), error = %err, "[BACKUP] Backup failed, continuing with next resource");
                    reporter.record(BackupEvent::ResourceFailed {
                        resource: resource.title.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    info!(
        backed_up = report.backed_up,
        in_scope = report.in_scope,
        total_seen = report.total_seen,
        "[BACKUP] Run complete"
    );
    Ok(report)
}

/// Download, stage and upload one stale resource. The staged file is
/// removed when its guard drops, whatever the upload outcome.
async fn backup_resource<F, S>(
    fetcher: &F,
    store: &S,
    staging: &StagingArea,
    clock: &KeyClock,
    bucket: &str,
    dataset: &Dataset,
    resource: &Resource,
) -> Result<String, BackupError>
where
    F: Fetcher,
    S: ObjectStore,
{
    info!(
        resource = %debug_name(dataset, resource),
        updated = ?resource.updated_at,
        "[BACKUP] Backing up resource"
    );

    // Probe only; staleness stays timestamp-based.
    match fetcher.head(&resource.url).await {
        Ok(headers) => debug!(
            url = %resource.url,
            etag = ?headers.get("etag"),
            content_length = ?headers.get("content-length"),
            "[BACKUP] Remote resource headers"
        ),
        Err(err) => debug!(url = %resource.url, error = %err, "[BACKUP] Header probe failed"),
    }

    let bytes = fetcher.download(&resource.url).await?;
    let object_key = key::object_key(&resource.title, clock.next());
    let staged = staging
        .stage(&object_key, &bytes)
        .map_err(BackupError::Staging)?;

    let metadata = upload_metadata(resource, &bytes);
    store
        .put_object(bucket, &object_key, staged.path(), &metadata)
        .await?;
    Ok(object_key)
}

/// Flat metadata attached at upload. Absent upstream fields are omitted
/// entirely, never written as empty strings.
fn upload_metadata(resource: &Resource, bytes: &[u8]) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("url".to_string(), resource.url.clone());
    metadata.insert("title".to_string(), resource.title.clone());
    if let Some(format) = &resource.format {
        metadata.insert("format".to_string(), format.clone());
    }
    if let Some(start) = &resource.valid_from {
        metadata.insert("start".to_string(), start.clone());
    }
    if let Some(end) = &resource.valid_until {
        metadata.insert("end".to_string(), end.clone());
    }
    metadata.insert("content-hash".to_string(), content_hash(bytes));
    metadata
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn debug_name(dataset: &Dataset, resource: &Resource) -> String {
    format!("{} - {}", dataset.title, resource.title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> Resource {
        Resource {
            title: "Lines".to_string(),
            url: "http://x/f.zip".to_string(),
            format: Some("GTFS".to_string()),
            updated_at: Some("2023-01-01T00:00:00Z".to_string()),
            valid_from: None,
            valid_until: None,
        }
    }

    #[test]
    fn metadata_omits_absent_fields() {
        let metadata = upload_metadata(&resource(), b"feed");
        assert_eq!(metadata.get("url").map(String::as_str), Some("http://x/f.zip"));
        assert_eq!(metadata.get("title").map(String::as_str), Some("Lines"));
        assert_eq!(metadata.get("format").map(String::as_str), Some("GTFS"));
        assert!(!metadata.contains_key("start"));
        assert!(!metadata.contains_key("end"));
    }

    #[test]
    fn metadata_carries_validity_bounds_when_present() {
        let mut with_bounds = resource();
        with_bounds.valid_from = Some("2023-01-01".to_string());
        with_bounds.valid_until = Some("2023-06-30".to_string());

        let metadata = upload_metadata(&with_bounds, b"feed");
        assert_eq!(metadata.get("start").map(String::as_str), Some("2023-01-01"));
        assert_eq!(metadata.get("end").map(String::as_str), Some("2023-06-30"));
    }

    #[test]
    fn content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
