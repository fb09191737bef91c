//! Catalog adapter: the transport catalog's datasets endpoint, normalized
//! into typed records.
//!
//! Raw JSON records are parsed into loose serde structs and validated here
//! so the engines never see missing-field errors. Resources without a URL
//! (nothing to retrieve) and records without identity fields are dropped at
//! this boundary.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::contract::{Catalog, Dataset, Resource};
use crate::error::CatalogError;

const CATALOG_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct RawDataset {
    datagouv_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    url: Option<String>,
    title: Option<String>,
    format: Option<String>,
    updated: Option<String>,
    metadata: Option<RawResourceMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawResourceMetadata {
    start_date: Option<String>,
    end_date: Option<String>,
}

/// HTTP-backed [`Catalog`] implementation.
pub struct HttpCatalog {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(CATALOG_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn list_datasets(&self) -> Result<Vec<Dataset>, CatalogError> {
        info!(url = %self.url, "Fetching dataset catalog");
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Malformed(format!(
                "catalog endpoint returned status {}",
                response.status()
            )));
        }
        let raw: Vec<RawDataset> = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;

        let datasets: Vec<Dataset> = raw.into_iter().filter_map(normalize_dataset).collect();
        info!(datasets = datasets.len(), "Catalog fetched and normalized");
        Ok(datasets)
    }
}

fn normalize_dataset(raw: RawDataset) -> Option<Dataset> {
    let Some(id) = raw.datagouv_id else {
        warn!(title = ?raw.title, "Dropping dataset without a catalog id");
        return None;
    };
    let title = raw.title.unwrap_or_else(|| id.clone());
    let resources = raw
        .resources
        .into_iter()
        .filter_map(|r| normalize_resource(&title, r))
        .collect();
    Some(Dataset {
        id,
        title,
        kind: raw.kind.unwrap_or_default(),
        resources,
    })
}

fn normalize_resource(dataset_title: &str, raw: RawResource) -> Option<Resource> {
    let Some(url) = raw.url else {
        debug!(dataset = %dataset_title, resource = ?raw.title, "Dropping resource without a URL");
        return None;
    };
    let Some(title) = raw.title else {
        warn!(dataset = %dataset_title, url = %url, "Dropping resource without a title");
        return None;
    };
    let (valid_from, valid_until) = match raw.metadata {
        Some(metadata) => (metadata.start_date, metadata.end_date),
        None => (None, None),
    };
    Some(Resource {
        title,
        url,
        format: raw.format,
        updated_at: raw.updated,
        valid_from,
        valid_until,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawDataset {
        serde_json::from_value(value).expect("raw dataset should deserialize")
    }

    #[test]
    fn normalizes_a_full_dataset() {
        let dataset = normalize_dataset(raw(json!({
            "datagouv_id": "D1",
            "title": "Réseau urbain",
            "type": "public-transit",
            "resources": [{
                "url": "http://x/f.zip",
                "title": "Lines",
                "format": "GTFS",
                "updated": "2023-01-01T00:00:00Z",
                "metadata": {"start_date": "2023-01-01", "end_date": "2023-06-30"}
            }]
        })))
        .expect("dataset should normalize");

        assert_eq!(dataset.id, "D1");
        assert_eq!(dataset.kind, "public-transit");
        assert_eq!(dataset.resources.len(), 1);
        let resource = &dataset.resources[0];
        assert_eq!(resource.title, "Lines");
        assert_eq!(resource.valid_from.as_deref(), Some("2023-01-01"));
        assert_eq!(resource.valid_until.as_deref(), Some("2023-06-30"));
    }

    #[test]
    fn drops_dataset_without_identity() {
        assert!(normalize_dataset(raw(json!({"title": "anonymous"}))).is_none());
    }

    #[test]
    fn drops_resources_without_url_or_title() {
        let dataset = normalize_dataset(raw(json!({
            "datagouv_id": "D2",
            "title": "Mixed",
            "type": "public-transit",
            "resources": [
                {"title": "no url", "format": "GTFS"},
                {"url": "http://x/untitled.zip", "format": "GTFS"},
                {"url": "http://x/ok.zip", "title": "ok", "format": "GTFS"}
            ]
        })))
        .expect("dataset should normalize");

        assert_eq!(dataset.resources.len(), 1);
        assert_eq!(dataset.resources[0].title, "ok");
    }

    #[test]
    fn missing_kind_defaults_to_empty() {
        let dataset = normalize_dataset(raw(json!({"datagouv_id": "D3"}))).unwrap();
        assert_eq!(dataset.kind, "");
        assert!(dataset.resources.is_empty());
    }
}
