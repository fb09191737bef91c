use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Runtime settings with production defaults; a YAML file can override any
/// of them (see [`crate::load_config`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog endpoint listing all datasets with their resources.
    pub catalog_url: String,
    /// Object store endpoint.
    pub endpoint: String,
    /// Region name handed to the store client. Cellar ignores it, but the
    /// client requires one.
    pub region: String,
    /// Root directory for staged downloads.
    pub staging_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: "https://transport.data.gouv.fr/api/datasets".to_string(),
            endpoint: "https://cellar-c2.services.clever-cloud.com".to_string(),
            region: "us-east-1".to_string(),
            staging_dir: PathBuf::from("./tmp"),
        }
    }
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            catalog_url = %self.catalog_url,
            endpoint = %self.endpoint,
            staging_dir = %self.staging_dir.display(),
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
