/// `load_config` module: loads an optional YAML settings file over the
/// built-in defaults.
///
/// This is the only place where untrusted YAML is parsed and mapped onto
/// [`Config`]. Every field in the file is optional; anything omitted keeps
/// its default. Store credentials never live here: they are CLI
/// parameters or environment variables.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;

#[derive(Debug, Deserialize)]
struct RawConfig {
    catalog_url: Option<String>,
    endpoint: Option<String>,
    region: Option<String>,
    staging_dir: Option<PathBuf>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&content) {
        Ok(raw) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            raw
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let mut config = Config::default();
    if let Some(catalog_url) = raw.catalog_url {
        config.catalog_url = catalog_url;
    }
    if let Some(endpoint) = raw.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(region) = raw.region {
        config.region = region;
    }
    if let Some(staging_dir) = raw.staging_dir {
        config.staging_dir = staging_dir;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn overrides_only_the_fields_present() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: http://localhost:9000").unwrap();
        writeln!(file, "staging_dir: /var/tmp/transit").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://localhost:9000");
        assert_eq!(config.staging_dir, PathBuf::from("/var/tmp/transit"));
        assert_eq!(config.catalog_url, Config::default().catalog_url);
        assert_eq!(config.region, Config::default().region);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config("/definitely/not/here.yml").is_err());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: [unclosed").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
