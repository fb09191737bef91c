//! Maintenance operations: bucket listings, purges, single deletions.

use futures::future::try_join_all;
use tracing::info;

use crate::contract::{BackupObject, ObjectStore};
use crate::error::StoreError;

/// Snapshot of one bucket and everything in it.
#[derive(Debug)]
pub struct BucketListing {
    pub bucket: String,
    pub objects: Vec<BackupObject>,
}

/// List every bucket with its objects.
pub async fn list_all<S: ObjectStore>(store: &S) -> Result<Vec<BucketListing>, StoreError> {
    let mut listings = Vec::new();
    for bucket in store.list_buckets().await? {
        let objects = store.list_objects(&bucket, "").await?;
        listings.push(BucketListing { bucket, objects });
    }
    Ok(listings)
}

/// Delete every object in the bucket, then the bucket itself. The store
/// refuses to drop a non-empty bucket, so members go first. Returns the
/// number of objects deleted.
pub async fn purge_bucket<S: ObjectStore>(store: &S, bucket: &str) -> Result<usize, StoreError> {
    let objects = store.list_objects(bucket, "").await?;
    let deletions = objects
        .iter()
        .map(|object| store.delete_object(bucket, &object.key));
    try_join_all(deletions).await?;
    store.delete_bucket(bucket).await?;
    info!(bucket = %bucket, deleted = objects.len(), "Purged bucket");
    Ok(objects.len())
}

/// Purge every bucket in the store. Returns the number of objects deleted
/// across all of them.
pub async fn purge_all<S: ObjectStore>(store: &S) -> Result<usize, StoreError> {
    let mut deleted = 0;
    for bucket in store.list_buckets().await? {
        deleted += purge_bucket(store, &bucket).await?;
    }
    Ok(deleted)
}
