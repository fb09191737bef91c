//! Deduplication engine: reconcile a bucket down to one copy per logical
//! resource.
//!
//! Objects group by their (title, content-hash) metadata; within a group
//! the most recently modified member survives and the rest are deleted.
//! Many stored objects predate content hashing, so groups frequently key
//! on title alone: two hash-less objects sharing a title count as copies
//! of each other, as the historical data demands.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::contract::{BackupEvent, BackupObject, ObjectStore, Reporter};
use crate::error::StoreError;

/// Logical identity of a stored copy, with defined equality and ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DuplicateKey {
    pub title: String,
    pub content_hash: Option<String>,
}

/// Totals for one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DedupReport {
    /// Objects examined.
    pub scanned: usize,
    /// Groups holding more than one copy.
    pub duplicate_groups: usize,
    /// Copies deleted; in dry-run mode, copies that would have been.
    pub deleted: usize,
}

/// Reconcile one bucket. With `dry_run`, deletions are only reported.
pub async fn run_dedup<S, R>(
    store: &S,
    reporter: &R,
    bucket: &str,
    dry_run: bool,
) -> Result<DedupReport, StoreError>
where
    S: ObjectStore,
    R: Reporter,
{
    info!(bucket = %bucket, dry_run, "[DEDUP] Reconciling bucket");
    let objects = store.list_objects(bucket, "").await?;

    let mut report = DedupReport {
        scanned: objects.len(),
        ..DedupReport::default()
    };

    let mut groups: BTreeMap<DuplicateKey, Vec<BackupObject>> = BTreeMap::new();
    for object in objects {
        let metadata = store.object_metadata(bucket, &object.key).await?;
        let Some(title) = metadata.get("title") else {
            // Without a title the object cannot be attributed to a logical
            // resource; leave it alone rather than guess.
            debug!(bucket = %bucket, key = %object.key, "[DEDUP] Object has no title metadata, skipping");
            continue;
        };
        let group_key = DuplicateKey {
            title: title.clone(),
            content_hash: metadata.get("content-hash").cloned(),
        };
        groups.entry(group_key).or_default().push(object);
    }

    for (group_key, members) in groups {
        if members.len() <= 1 {
            continue;
        }
        report.duplicate_groups += 1;
        let survivor = survivor_index(&members);
        debug!(
            title = %group_key.title,
            copies = members.len(),
            survivor = %members[survivor].key,
            "[DEDUP] Duplicate group found"
        );

        for (index, member) in members.iter().enumerate() {
            if index == survivor {
                continue;
            }
            if dry_run {
                info!(bucket = %bucket, key = %member.key, "[DEDUP] Would delete duplicate (dry run)");
            } else {
                store.delete_object(bucket, &member.key).await?;
                reporter.record(BackupEvent::DuplicateDeleted {
                    bucket: bucket.to_string(),
                    key: member.key.clone(),
                });
            }
            report.deleted += 1;
        }
    }

    info!(
        bucket = %bucket,
        scanned = report.scanned,
        groups = report.duplicate_groups,
        deleted = report.deleted,
        "[DEDUP] Bucket reconciled"
    );
    Ok(report)
}

/// Sweep every bucket. A failing bucket is warned about and skipped; the
/// sweep continues.
pub async fn run_dedup_all<S, R>(
    store: &S,
    reporter: &R,
    dry_run: bool,
) -> Result<DedupReport, StoreError>
where
    S: ObjectStore,
    R: Reporter,
{
    let mut total = DedupReport::default();
    for bucket in store.list_buckets().await? {
        match run_dedup(store, reporter, &bucket, dry_run).await {
            Ok(report) => {
                total.scanned += report.scanned;
                total.duplicate_groups += report.duplicate_groups;
                total.deleted += report.deleted;
            }
            Err(err) => {
                warn!(bucket = %bucket, error = %err, "[DEDUP] Bucket reconciliation failed, continuing sweep");
            }
        }
    }
    Ok(total)
}

/// Index of the member to keep: maximum `last_modified`, with the
/// first-listed member winning ties.
fn survivor_index(members: &[BackupObject]) -> usize {
    let mut best = 0;
    for (index, member) in members.iter().enumerate().skip(1) {
        if member.last_modified > members[best].last_modified {
            best = index;
        }
    }
    best
}
