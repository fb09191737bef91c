/// CLI glue: argument parsing and command routing.
///
/// All pipeline logic lives in the library modules; this module only wires
/// the collaborators together and surfaces errors. Store credentials are
/// taken as parameters (with environment fallbacks) and handed straight to
/// the store adapter.
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::admin;
use crate::backup::run_backup;
use crate::catalog::HttpCatalog;
use crate::config::Config;
use crate::contract::{ObjectStore, TracingReporter};
use crate::dedup;
use crate::fetch::HttpFetcher;
use crate::load_config::load_config;
use crate::staging::StagingArea;
use crate::store::{S3Store, StoreConfig};

/// CLI for transit-backup: mirror transit feeds into an object store.
#[derive(Parser)]
#[clap(
    name = "transit-backup",
    version,
    about = "Mirror transit feeds into a bucket-per-dataset object store"
)]
pub struct Cli {
    /// Object store access key id
    #[clap(long, env = "CELLAR_ACCESS_KEY_ID")]
    pub access_key: String,

    /// Object store secret access key
    #[clap(long, env = "CELLAR_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Optional YAML settings file overriding the built-in defaults
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Back up every in-scope resource that changed since its last backup
    BackupAll,
    /// List every bucket with its stored objects
    ListAll,
    /// Delete every object and every bucket
    DeleteAll,
    /// Delete duplicate copies, keeping the most recent of each group
    DeleteDuplicates {
        /// Reconcile only this bucket instead of sweeping all of them
        #[clap(long)]
        bucket: Option<String>,
        /// Report what would be deleted without deleting anything
        #[clap(long)]
        dry_run: bool,
    },
    /// Delete a single object
    DeleteObject { bucket: String, key: String },
}

/// Async CLI entrypoint, extracted for programmatic use and tests.
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    config.trace_loaded();

    let store = S3Store::new(StoreConfig {
        endpoint: config.endpoint.clone(),
        region: config.region.clone(),
        access_key_id: cli.access_key.clone(),
        secret_access_key: cli.secret_key.clone(),
    });
    let reporter = TracingReporter;

    match cli.command {
        Commands::BackupAll => {
            let catalog = HttpCatalog::new(config.catalog_url.clone())?;
            let fetcher = HttpFetcher::new()?;
            let staging = StagingArea::new(&config.staging_dir);
            let report = run_backup(&catalog, &fetcher, &store, &staging, &reporter).await?;
            info!(
                backed_up = report.backed_up,
                in_scope = report.in_scope,
                total_seen = report.total_seen,
                "Backup run finished"
            );
        }
        Commands::ListAll => {
            for listing in admin::list_all(&store).await? {
                info!(bucket = %listing.bucket, objects = listing.objects.len(), "Bucket");
                for object in &listing.objects {
                    info!(
                        key = %object.key,
                        last_modified = %object.last_modified,
                        size = ?object.size,
                        etag = ?object.etag,
                        "Object"
                    );
                }
            }
        }
        Commands::DeleteAll => {
            let deleted = admin::purge_all(&store).await?;
            info!(deleted, "Deleted all buckets");
        }
        Commands::DeleteDuplicates { bucket, dry_run } => {
            let report = match bucket {
                Some(bucket) => dedup::run_dedup(&store, &reporter, &bucket, dry_run).await?,
                None => dedup::run_dedup_all(&store, &reporter, dry_run).await?,
            };
            info!(
                scanned = report.scanned,
                groups = report.duplicate_groups,
                deleted = report.deleted,
                dry_run,
                "Deduplication finished"
            );
        }
        Commands::DeleteObject { bucket, key } => {
            store.delete_object(&bucket, &key).await?;
            info!(bucket = %bucket, key = %key, "Deleted object");
        }
    }

    Ok(())
}
