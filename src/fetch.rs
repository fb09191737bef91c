//! Resource fetcher: plain HTTP download plus a best-effort header probe.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::contract::Fetcher;
use crate::error::FetchError;

/// Feeds can be large archives; give downloads room to finish while still
/// bounding every call.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP-backed [`Fetcher`] implementation.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

fn header_map(response: &reqwest::Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        debug!(url = %url, size = bytes.len(), "Downloaded resource bytes");
        Ok(bytes.to_vec())
    }

    async fn head(&self, url: &str) -> Result<HashMap<String, String>, FetchError> {
        let response = self.client.head(url).send().await?;
        let mut headers = header_map(&response);
        // Some hosts answer the probe with a redirect location instead of
        // the final headers; probe the referenced location once.
        if let Some(location) = headers.get("location").cloned() {
            let follow = self.client.head(&location).send().await?;
            headers = header_map(&follow);
        }
        Ok(headers)
    }
}
