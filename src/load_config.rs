//! `load_config` module: reads the optional YAML config file and applies
//! environment overrides.
//!
//! Everything here is optional. Without `--config` the tool runs on defaults:
//! region and credentials come from the AWS profile chain, and the website
//! documents are `index.html` / `error.html`.
//!
//! Accepted YAML:
//!
//! ```yaml
//! region: eu-west-1          # overrides the profile's region
//! endpoint: http://localhost:9000   # S3-compatible endpoint, path-style addressing
//! website:
//!   index_document: index.html
//!   error_document: 404.html
//! ```
//!
//! `BUCKET_SITE_REGION` and `BUCKET_SITE_ENDPOINT` override the file.
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.

use anyhow::Result;
use bucket_site_core::config::WebsiteConfig;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const REGION_ENV: &str = "BUCKET_SITE_REGION";
pub const ENDPOINT_ENV: &str = "BUCKET_SITE_ENDPOINT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub website: WebsiteConfig,
}

impl CliConfig {
    fn apply_env_overrides(&mut self) {
        if let Some(region) = non_empty_env(REGION_ENV) {
            info!(env = REGION_ENV, %region, "Region overridden from environment");
            self.region = Some(region);
        }
        if let Some(endpoint) = non_empty_env(ENDPOINT_ENV) {
            info!(env = ENDPOINT_ENV, %endpoint, "Endpoint overridden from environment");
            self.endpoint = Some(endpoint);
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Loads a YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
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

    // An empty file is a valid, all-defaults config.
    let mut config: CliConfig = if config_content.trim().is_empty() {
        CliConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    config.apply_env_overrides();
    config.website.trace_loaded();
    Ok(config)
}

/// Like [`load_config`], but falls back to defaults (plus environment overrides)
/// when no path was given.
pub fn load_optional_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = CliConfig::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }
}
