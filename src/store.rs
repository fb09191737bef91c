//! S3-compatible object store adapter.
//!
//! Wraps the AWS SDK client behind [`ObjectStore`]. The endpoint and
//! credentials are caller-supplied; path-style addressing is forced
//! because Cellar-style stores require it.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::contract::{BackupObject, ObjectStore};
use crate::error::StoreError;

/// Store connection settings. Credentials are caller-supplied
/// configuration; the core never manages them.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(config: StoreConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "transit-backup",
        );
        let client_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .endpoint_url(config.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(client_config),
        }
    }
}

fn to_chrono(timestamp: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos()).unwrap_or_default()
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!(bucket = %bucket, "Bucket created");
                Ok(())
            }
            Err(err) => {
                let service = err.into_service_error();
                if service.is_bucket_already_owned_by_you() || service.is_bucket_already_exists() {
                    Ok(())
                } else {
                    Err(StoreError::S3(service.to_string()))
                }
            }
        }
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        Ok(response
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<BackupObject>, StoreError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StoreError::S3(e.to_string()))?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                let Some(last_modified) = object.last_modified() else {
                    continue;
                };
                objects.push(BackupObject {
                    key: key.to_string(),
                    last_modified: to_chrono(last_modified),
                    size: object.size(),
                    etag: object.e_tag().map(str::to_string),
                });
            }

            if response.is_truncated().unwrap_or(false) {
                continuation_token = response.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        Ok(response.metadata().cloned().unwrap_or_default())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &HashMap<String, String>,
    ) -> Result<(), StoreError> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .set_metadata(Some(metadata.clone()))
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        debug!(bucket = %bucket, key = %key, "Uploaded object");
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        debug!(bucket = %bucket, key = %key, "Deleted object");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        debug!(bucket = %bucket, "Deleted bucket");
        Ok(())
    }
}
